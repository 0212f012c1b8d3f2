//! Version reconciliation between the metadata's package and the one
//! installed in a library.
//!
//! Versions are compared as literal strings: `2.1` and `2.1.0` are different
//! versions here.
use crate::console::{Console, ConsoleCommand};
use crate::error::PipelineError;
use crate::metadata::PackageDescriptor;
use crate::report::{parse_package_report, PackageRow};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Package is absent from the library.
    Install { name: String, version: String },
    /// Package is present at a different version. Issues the same add command
    /// as `Install`.
    Reinstall {
        name: String,
        version: String,
        installed: String,
    },
    NoOp,
}

/// Decide how to bring `installed` in line with `declared`.
pub fn reconcile(declared: &PackageDescriptor, installed: &[PackageRow]) -> Action {
    let mut matches = installed.iter().filter(|row| row.name == declared.name);
    let Some(row) = matches.next() else {
        return Action::Install {
            name: declared.name.clone(),
            version: declared.version.clone(),
        };
    };
    let extra = matches.count();
    if extra > 0 {
        tracing::warn!(
            package = %declared.name,
            duplicates = extra + 1,
            "package listed more than once; using the first row"
        );
    }
    if row.version == declared.version {
        Action::NoOp
    } else {
        Action::Reinstall {
            name: declared.name.clone(),
            version: declared.version.clone(),
            installed: row.version.clone(),
        }
    }
}

/// List the library's packages, reconcile, and issue the add command if
/// needed. Never fails: listing and add failures are logged as warnings and
/// the action that was attempted is returned.
pub fn sync_package_version(
    console: &dyn Console,
    lib: &Path,
    declared: &PackageDescriptor,
) -> Action {
    tracing::info!(package = %declared.name, version = %declared.version, "expected package");
    let rows = match list_packages(console, lib) {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "could not read installed packages; treating as not installed"
            );
            Vec::new()
        }
    };

    let action = reconcile(declared, &rows);
    match &action {
        Action::NoOp => {
            tracing::info!(package = %declared.name, "package is up to date");
            return action;
        }
        Action::Install { name, version } => {
            tracing::info!(package = %name, "package not installed; adding {version}");
        }
        Action::Reinstall {
            name,
            version,
            installed,
        } => {
            tracing::info!(
                package = %name,
                installed = %installed,
                "re-adding package at {version}"
            );
        }
    }

    let command = ConsoleCommand::AddPackage {
        package: declared.name.clone(),
        version: declared.version.clone(),
        lib: lib.to_path_buf(),
    };
    match console
        .invoke(&command)
        .and_then(|output| output.into_checked(&command))
    {
        Ok(_) => tracing::info!(
            package = %declared.name,
            version = %declared.version,
            "package added"
        ),
        Err(err) => tracing::warn!(error = %err, "package add failed; continuing"),
    }
    action
}

pub fn list_packages(
    console: &dyn Console,
    lib: &Path,
) -> Result<Vec<PackageRow>, PipelineError> {
    let command = ConsoleCommand::ListPackages {
        lib: lib.to_path_buf(),
    };
    let output = console.invoke(&command)?.into_checked(&command)?;
    parse_package_report(&output.stdout)
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
