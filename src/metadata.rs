//! Package metadata descriptor (`metadata.xml`).
//!
//! The root element names the package and its version; each `onlineLibrary`
//! child declares a template library archive to test. The document is only
//! read, never rewritten.
use crate::error::PipelineError;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const LIBRARY_ELEMENT: &str = "onlineLibrary";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
}

/// A declared online library: a name and the URI of its archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySource {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub path: PathBuf,
    pub package: PackageDescriptor,
    pub libraries: Vec<LibrarySource>,
}

/// Read and parse the descriptor at `path`.
pub fn load_metadata(path: &Path) -> Result<PackageMetadata, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|err| PipelineError::MetadataParse {
        path: path.to_path_buf(),
        message: format!("read: {err}"),
    })?;
    parse_metadata(path, &text)
}

pub fn parse_metadata(path: &Path, text: &str) -> Result<PackageMetadata, PipelineError> {
    let fail = |message: String| PipelineError::MetadataParse {
        path: path.to_path_buf(),
        message,
    };
    let doc = roxmltree::Document::parse(text).map_err(|err| fail(err.to_string()))?;
    let root = doc.root_element();

    let package = PackageDescriptor {
        name: required_attr(path, root, "name")?,
        version: required_attr(path, root, "version")?,
    };

    let mut libraries = Vec::new();
    for node in root
        .children()
        .filter(|node| node.has_tag_name(LIBRARY_ELEMENT))
    {
        let source = LibrarySource {
            name: required_attr(path, node, "name")?,
            location: required_attr(path, node, "libraryLocation")?,
        };
        tracing::info!(library = %source.name, "found template library");
        libraries.push(source);
    }

    Ok(PackageMetadata {
        path: path.to_path_buf(),
        package,
        libraries,
    })
}

fn required_attr(
    path: &Path,
    node: roxmltree::Node<'_, '_>,
    name: &str,
) -> Result<String, PipelineError> {
    node.attribute(name)
        .map(str::to_string)
        .ok_or_else(|| PipelineError::MetadataParse {
            path: path.to_path_buf(),
            message: format!(
                "<{}> is missing the {name:?} attribute",
                node.tag_name().name()
            ),
        })
}
