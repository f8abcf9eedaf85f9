//! Document model.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Kind of source file, which decides how pages are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Multi-page PDF, rasterized page by page.
    Pdf,
    /// Single raster image, treated as a one-page document.
    Image,
}

impl DocumentKind {
    /// Determine the kind from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    /// Determine the kind from a detected MIME type.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            "application/pdf" => Some(DocumentKind::Pdf),
            "image/png" | "image/jpeg" | "image/tiff" | "image/gif" | "image/bmp" => {
                Some(DocumentKind::Image)
            }
            _ => None,
        }
    }
}

/// A document in the current batch.
///
/// The name is the original filename and is unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl Document {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    /// Build a document from a path, naming it after the file.
    ///
    /// Returns `None` if the extension is not a supported document type.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let kind = DocumentKind::from_filename(&name)?;
        Some(Self::new(name, path, kind))
    }
}
