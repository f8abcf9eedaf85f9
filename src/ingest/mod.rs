//! Document ingestion from directories and zip archives.
//!
//! Produces the flat, uniquely-named document list a batch runs over. Zip
//! archives are unpacked into a temporary workspace that lives as long as the
//! [`DocumentSource`].

mod archive;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::models::{Document, DocumentKind};

pub use archive::is_zip;

/// Errors that can occur while collecting documents.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input {0}: expected a directory or zip archive")]
    UnsupportedInput(PathBuf),

    #[error("Failed to open archive: {0}")]
    OpenFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A batch of documents ready for extraction.
#[derive(Debug)]
pub struct DocumentSource {
    documents: Vec<Document>,
    /// Unpacked archive contents, removed on drop.
    workspace: Option<TempDir>,
}

impl DocumentSource {
    /// Collect documents from a directory or a zip archive.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        if !path.exists() {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            Self::from_directory(path)
        } else if is_zip(path) {
            Self::from_zip(path)
        } else {
            Err(IngestError::UnsupportedInput(path.to_path_buf()))
        }
    }

    /// Collect supported files directly inside `dir` (not recursive).
    pub fn from_directory(dir: &Path) -> Result<Self, IngestError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        Ok(Self {
            documents: collect_documents(paths),
            workspace: None,
        })
    }

    /// Unpack supported files from a zip archive into a temporary workspace.
    pub fn from_zip(archive_path: &Path) -> Result<Self, IngestError> {
        let workspace = TempDir::new()?;
        let paths = archive::extract_supported(archive_path, workspace.path())?;
        Ok(Self {
            documents: collect_documents(paths),
            workspace: Some(workspace),
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> (Vec<Document>, Option<TempDir>) {
        (self.documents, self.workspace)
    }

    pub fn names(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Turn candidate paths into documents, sorted by name with duplicates removed.
fn collect_documents(paths: Vec<PathBuf>) -> Vec<Document> {
    let mut documents: Vec<Document> = paths
        .into_iter()
        .filter(|p| !is_hidden(p))
        .filter_map(|p| {
            let mut doc = Document::from_path(&p)?;
            if let Some(kind) = sniff_kind(&p) {
                if kind != doc.kind {
                    tracing::debug!("{}: content is {:?}, not {:?}", doc.name, kind, doc.kind);
                    doc.kind = kind;
                }
            }
            Some(doc)
        })
        .collect();

    documents.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = HashSet::new();
    documents.retain(|doc| {
        let fresh = seen.insert(doc.name.clone());
        if !fresh {
            tracing::warn!("Skipping duplicate document name: {}", doc.name);
        }
        fresh
    });
    documents
}

/// Detect the document kind from file content (magic bytes).
fn sniff_kind(path: &Path) -> Option<DocumentKind> {
    let detected = infer::get_from_path(path).ok().flatten()?;
    DocumentKind::from_mime(detected.mime_type())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true)
}
