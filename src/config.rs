//! Run configuration passed explicitly into the pipeline.
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONSOLE: &str = "SyncroSim.Console.exe";
pub const DEFAULT_PACKAGE_MANAGER: &str = "SyncroSim.PackageManager.exe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub console: PathBuf,
    pub work_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Resolve the console executable and create the working directory.
    pub fn resolve(
        console: &str,
        work_dir: Option<&Path>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let console = resolve_executable(console)?;
        let work_dir = work_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&work_dir)
            .with_context(|| format!("create working directory {}", work_dir.display()))?;
        Ok(Self {
            console,
            work_dir,
            timeout: timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Bare names are searched on `PATH`; paths must point at an executable.
pub fn resolve_executable(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|err| anyhow!("console executable {name:?} not found: {err}"))
}
