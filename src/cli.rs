//! CLI argument parsing for the test runner and the reinstall utility.
use crate::config::{DEFAULT_CONSOLE, DEFAULT_PACKAGE_MANAGER};
use clap::Parser;
use std::path::PathBuf;

/// Test-runner entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ssim-regress",
    version,
    about = "Download, update, and run every template library declared in a package's metadata",
    after_help = "Exit codes:\n  0  every library ran successfully\n  1  at least one library failed\n  2  fatal error (metadata, console, or arguments)\n\nExamples:\n  ssim-regress metadata.xml --console /opt/syncrosim/SyncroSim.Console.exe\n  ssim-regress metadata.xml --tempdir /tmp/ssim --timeout-secs 3600 --report report.json"
)]
pub struct RunArgs {
    /// Path to the package metadata.xml
    #[arg(value_name = "META")]
    pub meta: PathBuf,

    /// Path to the SyncroSim console
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONSOLE)]
    pub console: String,

    /// Working directory for downloads and extracted libraries
    #[arg(long, value_name = "DIR")]
    pub tempdir: Option<PathBuf>,

    /// Kill any console call that runs longer than this
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Write the run report as JSON
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug logging, including raw console output
    #[arg(long)]
    pub verbose: bool,
}

/// Reinstall utility entrypoint.
#[derive(Parser, Debug)]
#[command(name = "ssim-reinstall", version, about = "SyncroSim package utilities")]
pub struct ReinstallArgs {
    /// Path to metadata.xml
    #[arg(long, value_name = "PATH")]
    pub meta: PathBuf,

    /// Path to the SyncroSim package manager
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PACKAGE_MANAGER)]
    pub packagemanager: String,

    /// Reinstall the package using the metadata and --folder
    #[arg(long, requires = "folder")]
    pub reinstall: bool,

    /// Folder to install the package from
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_use_defaults() {
        let args = RunArgs::try_parse_from(["ssim-regress", "meta.xml"]).expect("parse");
        assert_eq!(args.meta, PathBuf::from("meta.xml"));
        assert_eq!(args.console, DEFAULT_CONSOLE);
        assert!(args.tempdir.is_none());
        assert!(args.timeout_secs.is_none());
    }

    #[test]
    fn run_args_accept_overrides() {
        let args = RunArgs::try_parse_from([
            "ssim-regress",
            "meta.xml",
            "--console",
            "/opt/ssim/console",
            "--tempdir",
            "/tmp/ssim",
            "--timeout-secs",
            "90",
        ])
        .expect("parse");
        assert_eq!(args.console, "/opt/ssim/console");
        assert_eq!(args.tempdir, Some(PathBuf::from("/tmp/ssim")));
        assert_eq!(args.timeout_secs, Some(90));
    }

    #[test]
    fn reinstall_requires_folder() {
        let err = ReinstallArgs::try_parse_from(["ssim-reinstall", "--meta", "m.xml", "--reinstall"])
            .expect_err("folder required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn reinstall_defaults_package_manager() {
        let args = ReinstallArgs::try_parse_from([
            "ssim-reinstall",
            "--meta",
            "m.xml",
            "--reinstall",
            "--folder",
            "pkg",
        ])
        .expect("parse");
        assert_eq!(args.packagemanager, DEFAULT_PACKAGE_MANAGER);
        assert!(args.reinstall);
    }
}
