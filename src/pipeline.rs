//! Per-library regression pipeline.
//!
//! Each declared library goes through
//! `Fetch -> Extract -> LocateProject -> UpdateLibrary -> PruneResults ->
//! ListRunnable -> SyncVersion -> Run`. Failures in fetch, extract, locate,
//! listing runnable scenarios, or the run itself end that library's pass;
//! update, prune and version sync are best effort. Every library yields one
//! `RunOutcome` and nothing already done to a library is rolled back.
use crate::console::{join_ids, Console, ConsoleCommand};
use crate::fetch::{extract_archive, locate_project_file, Fetcher, LibraryPaths};
use crate::metadata::{LibrarySource, PackageDescriptor, PackageMetadata};
use crate::reconcile::{sync_package_version, Action};
use crate::report::parse_update_ids;
use crate::scenarios::{delete_scenarios, list_scenarios, run_scenarios};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Fetch,
    Extract,
    LocateProject,
    UpdateLibrary,
    PruneResults,
    ListRunnable,
    SyncVersion,
    Run,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Fetch => "fetch",
            Step::Extract => "extract",
            Step::LocateProject => "locate_project",
            Step::UpdateLibrary => "update_library",
            Step::PruneResults => "prune_results",
            Step::ListRunnable => "list_runnable",
            Step::SyncVersion => "sync_version",
            Step::Run => "run",
        }
    }
}

/// Final record for one library.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub library_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file: Option<PathBuf>,
    pub scenario_ids: BTreeSet<u64>,
    pub succeeded: bool,
    pub elapsed_seconds: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Step>,
    pub pruned: Vec<u64>,
    pub update_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_action: Option<Action>,
}

impl RunOutcome {
    fn new(library_name: &str) -> Self {
        Self {
            library_name: library_name.to_string(),
            project_file: None,
            scenario_ids: BTreeSet::new(),
            succeeded: false,
            elapsed_seconds: 0.0,
            message: String::new(),
            failed_step: None,
            pruned: Vec::new(),
            update_ids: Vec::new(),
            sync_action: None,
        }
    }

    fn abort(mut self, step: Step, message: String) -> Self {
        tracing::warn!(library = %self.library_name, step = step.as_str(), "{message}");
        self.failed_step = Some(step);
        self.message = message;
        self
    }
}

/// Outcomes of every library in declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub package: PackageDescriptor,
    pub outcomes: Vec<RunOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Human-readable summary, one line per library plus a totals line.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let status = if outcome.succeeded { "PASS" } else { "FAIL" };
            let step = outcome
                .failed_step
                .map(|step| format!(" [{}]", step.as_str()))
                .unwrap_or_default();
            out.push_str(&format!(
                "{status} {}{step}: {} ({:.2}s)\n",
                outcome.library_name, outcome.message, outcome.elapsed_seconds
            ));
        }
        out.push_str(&format!(
            "{} libraries: {} passed, {} failed\n",
            self.outcomes.len(),
            self.succeeded(),
            self.failed()
        ));
        out
    }
}

/// Drives the console for every library declared in the metadata.
pub struct Pipeline<'a> {
    console: &'a dyn Console,
    fetcher: &'a dyn Fetcher,
    work_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(console: &'a dyn Console, fetcher: &'a dyn Fetcher, work_dir: PathBuf) -> Self {
        Self {
            console,
            fetcher,
            work_dir,
        }
    }

    /// Process every library in order. Never stops early.
    pub fn run(&self, metadata: &PackageMetadata) -> RunReport {
        let outcomes = metadata
            .libraries
            .iter()
            .enumerate()
            .map(|(index, source)| self.process_library(&metadata.package, index, source))
            .collect();
        RunReport {
            package: metadata.package.clone(),
            outcomes,
        }
    }

    pub fn process_library(
        &self,
        package: &PackageDescriptor,
        index: usize,
        source: &LibrarySource,
    ) -> RunOutcome {
        let span = tracing::info_span!("library", name = %source.name);
        let _guard = span.enter();
        let outcome = RunOutcome::new(&source.name);
        let paths = LibraryPaths::new(&self.work_dir, index, source);

        tracing::info!(location = %source.location, "downloading");
        if let Err(err) = self.fetcher.download(source, &paths.archive) {
            return outcome.abort(Step::Fetch, format!("download failed: {err}"));
        }
        tracing::info!(archive = %paths.archive.display(), "saved");

        match extract_archive(&paths.archive, &paths.extract_dir) {
            Ok(entries) => {
                tracing::info!(entries, dir = %paths.extract_dir.display(), "unzipped");
            }
            Err(err) => return outcome.abort(Step::Extract, err.to_string()),
        }

        let lib = match locate_project_file(&paths.extract_dir) {
            Ok(lib) => lib,
            Err(err) => return outcome.abort(Step::LocateProject, err.to_string()),
        };
        let outcome = RunOutcome {
            project_file: Some(lib.clone()),
            ..outcome
        };
        self.drive_library(package, &lib, outcome)
    }

    fn drive_library(
        &self,
        package: &PackageDescriptor,
        lib: &Path,
        mut outcome: RunOutcome,
    ) -> RunOutcome {
        outcome.update_ids = self.update_library(lib);

        match list_scenarios(self.console, lib, true) {
            Ok(results) => outcome.pruned = delete_scenarios(self.console, lib, &results),
            Err(err) => tracing::warn!(
                step = Step::PruneResults.as_str(),
                error = %err,
                "skipping result pruning"
            ),
        }

        let runnable = match list_scenarios(self.console, lib, false) {
            Ok(ids) if ids.is_empty() => {
                return outcome.abort(
                    Step::ListRunnable,
                    format!("no scenarios found in {}", lib.display()),
                )
            }
            Ok(ids) => ids,
            Err(err) => return outcome.abort(Step::ListRunnable, err.to_string()),
        };
        outcome.scenario_ids = runnable.clone();

        tracing::info!(
            step = Step::SyncVersion.as_str(),
            lib = %lib.display(),
            "checking package versions"
        );
        outcome.sync_action = Some(sync_package_version(self.console, lib, package));

        let id_list: Vec<u64> = runnable.iter().copied().collect();
        tracing::info!(ids = %join_ids(&id_list), "running scenarios");
        match run_scenarios(self.console, lib, &runnable) {
            Ok(run) => {
                let seconds = run.elapsed.as_secs_f64();
                outcome.elapsed_seconds = seconds;
                outcome.succeeded = run.succeeded;
                if run.succeeded {
                    tracing::info!(seconds, "scenario run completed");
                    tracing::debug!(stdout = %run.stdout.trim(), "run output");
                    outcome.message = format!("completed in {seconds:.2} seconds");
                } else {
                    outcome.failed_step = Some(Step::Run);
                    outcome.message = format!(
                        "run failed after {seconds:.2} seconds: {}",
                        run.stderr.trim()
                    );
                    tracing::warn!("{}", outcome.message);
                }
                outcome
            }
            Err(err) => outcome.abort(Step::Run, err.to_string()),
        }
    }

    /// Advisory `--update`; returns the record ids it reports, or none on failure.
    fn update_library(&self, lib: &Path) -> Vec<u64> {
        let command = ConsoleCommand::Update {
            lib: lib.to_path_buf(),
        };
        match self
            .console
            .invoke(&command)
            .and_then(|output| output.into_checked(&command))
        {
            Ok(output) => {
                let ids = parse_update_ids(&output.stdout);
                tracing::info!(updated = ids.len(), "library updated");
                ids
            }
            Err(err) => {
                tracing::warn!(
                    step = Step::UpdateLibrary.as_str(),
                    error = %err,
                    "library update failed"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
