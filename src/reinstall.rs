//! Reinstall a package into the package manager from a local folder.
use crate::console::{Console, ConsoleCommand};
use crate::error::PipelineError;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReinstallOutcome {
    /// False when `--removeall` failed, usually because nothing was installed.
    pub removed: bool,
}

/// Remove every installed version of `package`, then install from `folder`.
/// A failed removal is only a warning; a failed install is an error.
pub fn reinstall_from_folder(
    console: &dyn Console,
    package: &str,
    folder: &Path,
) -> Result<ReinstallOutcome, PipelineError> {
    tracing::info!(package, "uninstalling package");
    let remove = ConsoleCommand::RemoveAll {
        package: package.to_string(),
    };
    let removed = match console
        .invoke(&remove)
        .and_then(|output| output.into_checked(&remove))
    {
        Ok(_) => {
            tracing::info!(package, "package uninstalled");
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, "uninstall failed or package not found");
            false
        }
    };

    tracing::info!(folder = %folder.display(), "installing package from folder");
    let install = ConsoleCommand::XInstall {
        folder: folder.to_path_buf(),
    };
    console.invoke(&install)?.into_checked(&install)?;
    tracing::info!(package, "package installed from folder");
    Ok(ReinstallOutcome { removed })
}
