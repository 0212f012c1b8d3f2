//! Error kinds raised while driving the console.
//!
//! Only metadata errors stop a run; everything else is caught at the library
//! boundary by the orchestrator and recorded on that library's outcome.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Descriptor missing, unreadable, or lacking required attributes.
    #[error("metadata {}: {message}", .path.display())]
    MetadataParse { path: PathBuf, message: String },

    /// Console could not be spawned, timed out, or exited non-zero.
    #[error("console {command} failed{}: {message}", exit_suffix(.exit_code))]
    ConsoleInvocation {
        command: &'static str,
        exit_code: Option<i32>,
        message: String,
    },

    /// Expected header tokens were not found in a list report.
    #[error("malformed {report} report: missing column {column:?}")]
    MalformedReport {
        report: &'static str,
        column: String,
    },

    /// Download failure or a corrupt/empty archive.
    #[error("archive {location}: {message}")]
    Archive { location: String, message: String },

    #[error("no .ssim project file found under {}", .dir.display())]
    MissingProjectFile { dir: PathBuf },

    /// `run` was requested with no scenario ids.
    #[error("no scenarios to run")]
    EmptyScenarioSet,
}

impl PipelineError {
    /// Fatal errors abort the whole run rather than a single library.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::MetadataParse { .. })
    }

    pub(crate) fn archive(location: &str, message: impl std::fmt::Display) -> Self {
        PipelineError::Archive {
            location: location.to_string(),
            message: message.to_string(),
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}
