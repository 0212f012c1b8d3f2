//! Regression runner for SyncroSim template libraries.
//!
//! Drives the SyncroSim console through command-line calls: fetch each
//! library declared in a package's metadata, bring its package version in
//! line, drop stored result scenarios, and run the remaining scenarios.
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod reconcile;
pub mod reinstall;
pub mod report;
pub mod scenarios;

#[cfg(test)]
mod testing;

pub use error::PipelineError;
