//! Library fetcher: download a library archive, unpack it into a per-library
//! directory, and locate the `.ssim` project inside.
use crate::error::PipelineError;
use crate::metadata::LibrarySource;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const PROJECT_EXTENSION: &str = "ssim";
const DEFAULT_ARCHIVE_NAME: &str = "library.ssimbak";

/// Fetches the raw archive for a library into `dest`.
pub trait Fetcher {
    fn download(&self, source: &LibrarySource, dest: &Path) -> Result<(), PipelineError>;
}

/// Fetches `http(s)://` locations with `ureq`; `file://` URIs and bare paths
/// are copied from disk.
#[derive(Debug, Default, Clone)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn download(&self, source: &LibrarySource, dest: &Path) -> Result<(), PipelineError> {
        let location = source.location.as_str();
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = ureq::get(location)
                .call()
                .map_err(|err| PipelineError::archive(location, err))?;
            let mut reader = response.into_body().into_reader();
            let mut file = File::create(dest)
                .map_err(|err| PipelineError::archive(location, format!("create: {err}")))?;
            std::io::copy(&mut reader, &mut file)
                .map_err(|err| PipelineError::archive(location, format!("download: {err}")))?;
        } else {
            std::fs::copy(local_path(location), dest)
                .map_err(|err| PipelineError::archive(location, format!("copy: {err}")))?;
        }
        Ok(())
    }
}

fn local_path(location: &str) -> PathBuf {
    let Some(rest) = location.strip_prefix("file://") else {
        return PathBuf::from(location);
    };
    // file:///C:/dir -> C:/dir
    let bytes = rest.as_bytes();
    if bytes.len() > 2 && bytes[0] == b'/' && bytes[2] == b':' {
        return PathBuf::from(&rest[1..]);
    }
    PathBuf::from(rest)
}

/// Directory-safe key for a library name.
pub fn library_key(name: &str) -> String {
    let key: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if key.is_empty() {
        "library".to_string()
    } else {
        key
    }
}

/// Last path segment of a location, without query or fragment.
pub fn archive_file_name(location: &str) -> String {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location);
    path.rsplit(['/', '\\'])
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(DEFAULT_ARCHIVE_NAME)
        .to_string()
}

/// Working paths owned by one library within the run's working directory.
///
/// The key carries the library's position in the metadata, so two names that
/// sanitise to the same text still get distinct directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub archive: PathBuf,
    pub extract_dir: PathBuf,
}

impl LibraryPaths {
    pub fn new(work_dir: &Path, index: usize, source: &LibrarySource) -> Self {
        let key = format!("{index}_{}", library_key(&source.name));
        Self {
            archive: work_dir.join(format!("{key}_{}", archive_file_name(&source.location))),
            extract_dir: work_dir.join(format!("{key}_unzipped")),
        }
    }
}

/// Unpack `archive` into `dest`, replacing anything left from an earlier run.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, PipelineError> {
    let location = archive.display().to_string();
    let file = File::open(archive).map_err(|err| PipelineError::archive(&location, err))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|err| {
        PipelineError::archive(&location, format!("invalid zip archive: {err}"))
    })?;
    if zip.is_empty() {
        return Err(PipelineError::archive(&location, "archive is empty"));
    }
    if dest.exists() {
        std::fs::remove_dir_all(dest).map_err(|err| {
            PipelineError::archive(&location, format!("clear {}: {err}", dest.display()))
        })?;
    }
    std::fs::create_dir_all(dest).map_err(|err| {
        PipelineError::archive(&location, format!("create {}: {err}", dest.display()))
    })?;
    zip.extract(dest)
        .map_err(|err| PipelineError::archive(&location, format!("extract: {err}")))?;
    Ok(zip.len())
}

/// First `.ssim` file by name, preferring the extraction root over nested
/// directories.
pub fn locate_project_file(dir: &Path) -> Result<PathBuf, PipelineError> {
    let missing = || PipelineError::MissingProjectFile {
        dir: dir.to_path_buf(),
    };
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&current)
            .map_err(|_| missing())?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        entries.sort();

        if let Some(project) = entries.iter().find(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION))
        }) {
            return Ok(project.clone());
        }
        // Reverse so the stack pops subdirectories in name order.
        pending.extend(entries.into_iter().filter(|path| path.is_dir()).rev());
    }
    Err(missing())
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
