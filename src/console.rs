//! Console adapter: argument vectors for the external console and a process
//! runner that captures its output.
//!
//! Nothing here parses output; callers hand `ConsoleOutput::stdout` to the
//! report parsers.
use crate::error::PipelineError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const POLL_INTERVAL_MS: u64 = 25;
// How long to keep reading pipes after a timeout kill.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// One console operation. `argv()` renders the exact flags the console expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    RemoveAll { package: String },
    XInstall { folder: PathBuf },
    ListPackages { lib: PathBuf },
    ListScenarios { lib: PathBuf },
    AddPackage {
        package: String,
        version: String,
        lib: PathBuf,
    },
    DeleteScenario { id: u64, lib: PathBuf },
    Update { lib: PathBuf },
    Run { lib: PathBuf, ids: Vec<u64> },
}

impl ConsoleCommand {
    pub fn argv(&self) -> Vec<String> {
        match self {
            ConsoleCommand::RemoveAll { package } => vec![format!("--removeall={package}")],
            ConsoleCommand::XInstall { folder } => vec![
                format!("--xinstall={}", folder.display()),
                "--force".to_string(),
            ],
            ConsoleCommand::ListPackages { lib } => vec![
                "--list".to_string(),
                "--packages".to_string(),
                lib_arg(lib),
            ],
            ConsoleCommand::ListScenarios { lib } => vec![
                "--list".to_string(),
                "--scenarios".to_string(),
                lib_arg(lib),
            ],
            ConsoleCommand::AddPackage {
                package,
                version,
                lib,
            } => vec![
                "--add".to_string(),
                "--package".to_string(),
                format!("--pkg={package}"),
                format!("--ver={version}"),
                lib_arg(lib),
            ],
            ConsoleCommand::DeleteScenario { id, lib } => vec![
                "--delete".to_string(),
                "--scenario".to_string(),
                format!("--sid={id}"),
                lib_arg(lib),
                "--force".to_string(),
            ],
            ConsoleCommand::Update { lib } => vec!["--update".to_string(), lib_arg(lib)],
            ConsoleCommand::Run { lib, ids } => vec![
                "--run".to_string(),
                lib_arg(lib),
                format!("--sids={}", join_ids(ids)),
            ],
        }
    }

    /// Short name used in logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConsoleCommand::RemoveAll { .. } => "removeall",
            ConsoleCommand::XInstall { .. } => "xinstall",
            ConsoleCommand::ListPackages { .. } => "list-packages",
            ConsoleCommand::ListScenarios { .. } => "list-scenarios",
            ConsoleCommand::AddPackage { .. } => "add-package",
            ConsoleCommand::DeleteScenario { .. } => "delete-scenario",
            ConsoleCommand::Update { .. } => "update",
            ConsoleCommand::Run { .. } => "run",
        }
    }
}

fn lib_arg(lib: &Path) -> String {
    format!("--lib={}", lib.display())
}

pub fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Captured result of a single console call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ConsoleOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Convert a failed call into `ConsoleInvocation`, taking the message from stderr.
    pub fn into_checked(self, command: &ConsoleCommand) -> Result<ConsoleOutput, PipelineError> {
        if self.success() {
            return Ok(self);
        }
        let message = if self.timed_out {
            "timed out".to_string()
        } else {
            self.stderr.trim().to_string()
        };
        Err(PipelineError::ConsoleInvocation {
            command: command.label(),
            exit_code: self.exit_code,
            message,
        })
    }
}

/// Seam between the pipeline and the external console.
pub trait Console {
    fn invoke(&self, command: &ConsoleCommand) -> Result<ConsoleOutput, PipelineError>;
}

/// Runs the console executable as a child process, one call at a time.
#[derive(Debug, Clone)]
pub struct ProcessConsole {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessConsole {
    pub fn new(executable: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Console for ProcessConsole {
    fn invoke(&self, command: &ConsoleCommand) -> Result<ConsoleOutput, PipelineError> {
        let argv = command.argv();
        tracing::debug!(command = command.label(), ?argv, "invoke console");

        let spawn_error = |err: std::io::Error| PipelineError::ConsoleInvocation {
            command: command.label(),
            exit_code: None,
            message: format!("spawn {}: {err}", self.executable.display()),
        };

        let start = Instant::now();
        let mut cmd = Command::new(&self.executable);
        cmd.args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group, so a timeout can take down workers the console starts.
            cmd.process_group(0);
        }
        let mut child = cmd.spawn().map_err(spawn_error)?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let mut timed_out = false;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(spawn_error)? {
                break status;
            }
            if self.timeout.is_some_and(|timeout| start.elapsed() > timeout) {
                timed_out = true;
                kill_tree(&mut child);
                break child.wait().map_err(spawn_error)?;
            }
            std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
        };

        // Descendants outside the group may still hold the pipes open.
        let deadline = timed_out.then(|| Instant::now() + DRAIN_GRACE);
        let stdout = collect(stdout, deadline);
        let stderr = collect(stderr, deadline);
        tracing::debug!(
            command = command.label(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            exit_code = status.code(),
            timed_out,
            "console finished"
        );

        Ok(ConsoleOutput {
            stdout,
            stderr,
            exit_code: status.code(),
            timed_out,
        })
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    if let Ok(pid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain kill(2) on the group the child leads; no memory is shared.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Bytes read from one pipe so far, plus a signal sent once the pipe closes.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

// Pipes are drained on their own threads while the parent polls for exit.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Capture> {
    pipe.map(|mut pipe| {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        std::thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => match sink.lock() {
                        Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                }
            }
            let _ = tx.send(());
        });
        Capture { buf, done }
    })
}

/// Wait for the pipe to close, or until `deadline`, and return what was read.
fn collect(capture: Option<Capture>, deadline: Option<Instant>) -> String {
    let Some(capture) = capture else {
        return String::new();
    };
    match deadline {
        Some(deadline) => {
            let wait = deadline.saturating_duration_since(Instant::now());
            if capture.done.recv_timeout(wait).is_err() {
                tracing::debug!("pipe still open after kill; keeping partial output");
            }
        }
        None => {
            let _ = capture.done.recv();
        }
    }
    let bytes = match capture.buf.lock() {
        Ok(mut buf) => std::mem::take(&mut *buf),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
