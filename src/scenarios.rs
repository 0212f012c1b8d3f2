//! Scenario listing, pruning of stored results, and execution.
use crate::console::{Console, ConsoleCommand};
use crate::error::PipelineError;
use crate::report::parse_scenario_report;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

/// Result of a single `--run` call.
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub succeeded: bool,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
}

/// Ids of scenarios whose `IsResult` flag equals `results_only`.
pub fn list_scenarios(
    console: &dyn Console,
    lib: &Path,
    results_only: bool,
) -> Result<BTreeSet<u64>, PipelineError> {
    let command = ConsoleCommand::ListScenarios {
        lib: lib.to_path_buf(),
    };
    let output = console.invoke(&command)?.into_checked(&command)?;
    let ids: BTreeSet<u64> = parse_scenario_report(&output.stdout)?
        .into_iter()
        .filter(|row| row.is_result == results_only)
        .map(|row| row.id)
        .collect();
    let label = if results_only { "result" } else { "non-result" };
    tracing::info!(
        kind = label,
        ids = %ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", "),
        "listed scenarios"
    );
    Ok(ids)
}

/// Delete each scenario independently. Returns the ids that were deleted;
/// failures are logged and do not stop the remaining deletions.
pub fn delete_scenarios(console: &dyn Console, lib: &Path, ids: &BTreeSet<u64>) -> Vec<u64> {
    if ids.is_empty() {
        tracing::info!("no result scenarios to delete");
        return Vec::new();
    }
    let mut deleted = Vec::with_capacity(ids.len());
    for &id in ids {
        let command = ConsoleCommand::DeleteScenario {
            id,
            lib: lib.to_path_buf(),
        };
        match console
            .invoke(&command)
            .and_then(|output| output.into_checked(&command))
        {
            Ok(_) => {
                tracing::info!(id, "deleted scenario");
                deleted.push(id);
            }
            Err(err) => tracing::warn!(id, error = %err, "failed to delete scenario"),
        }
    }
    deleted
}

/// Run all `ids` in one console call, timing it. A non-zero exit is reported
/// through `ScenarioRun::succeeded`; only spawn failures and timeouts are
/// errors.
pub fn run_scenarios(
    console: &dyn Console,
    lib: &Path,
    ids: &BTreeSet<u64>,
) -> Result<ScenarioRun, PipelineError> {
    if ids.is_empty() {
        return Err(PipelineError::EmptyScenarioSet);
    }
    let command = ConsoleCommand::Run {
        lib: lib.to_path_buf(),
        ids: ids.iter().copied().collect(),
    };
    let start = Instant::now();
    let output = console.invoke(&command)?;
    let elapsed = start.elapsed();
    if output.timed_out {
        return Err(PipelineError::ConsoleInvocation {
            command: command.label(),
            exit_code: output.exit_code,
            message: format!("timed out after {:.2} seconds", elapsed.as_secs_f64()),
        });
    }
    Ok(ScenarioRun {
        succeeded: output.success(),
        elapsed,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

#[cfg(test)]
#[path = "scenarios_tests.rs"]
mod tests;
