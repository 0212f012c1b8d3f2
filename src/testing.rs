//! Scripted console and fetcher doubles shared by unit tests.
use crate::console::{Console, ConsoleCommand, ConsoleOutput};
use crate::error::PipelineError;
use crate::fetch::Fetcher;
use crate::metadata::LibrarySource;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;

type Handler = Box<dyn Fn(&ConsoleCommand) -> ConsoleOutput>;

/// Console that records every command and answers from a closure.
pub(crate) struct FakeConsole {
    handler: Handler,
    calls: RefCell<Vec<ConsoleCommand>>,
}

impl FakeConsole {
    pub(crate) fn new(handler: impl Fn(&ConsoleCommand) -> ConsoleOutput + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<ConsoleCommand> {
        self.calls.borrow().clone()
    }

    pub(crate) fn labels(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(ConsoleCommand::label).collect()
    }
}

impl Console for FakeConsole {
    fn invoke(&self, command: &ConsoleCommand) -> Result<ConsoleOutput, PipelineError> {
        self.calls.borrow_mut().push(command.clone());
        Ok((self.handler)(command))
    }
}

pub(crate) fn ok(stdout: &str) -> ConsoleOutput {
    ConsoleOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: Some(0),
        timed_out: false,
    }
}

pub(crate) fn failed(code: i32, stderr: &str) -> ConsoleOutput {
    ConsoleOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code: Some(code),
        timed_out: false,
    }
}

/// Writes a one-project zip for every library except those named in `fail`.
pub(crate) struct FakeFetcher {
    pub(crate) fail: Vec<String>,
}

impl Fetcher for FakeFetcher {
    fn download(&self, source: &LibrarySource, dest: &Path) -> Result<(), PipelineError> {
        if self.fail.contains(&source.name) {
            return Err(PipelineError::Archive {
                location: source.location.clone(),
                message: "connection refused".to_string(),
            });
        }
        let file = std::fs::File::create(dest).expect("create archive");
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("library.ssim", zip::write::SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(b"db").expect("write entry");
        zip.finish().expect("finish zip");
        Ok(())
    }
}
