//! Page rasterization.
//!
//! A [`PageRenderer`] turns one page of a [`Document`] into a raster image
//! on disk. Each rendered page owns its own scratch directory, removed when
//! the [`RasterPage`] is dropped.

mod poppler;

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::models::Document;

pub use poppler::{PdftoppmRenderer, DEFAULT_DPI};

/// Errors that can occur while rasterizing pages.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Unreadable document: {0}")]
    Unreadable(String),

    #[error("Render failed for page {page}: {reason}")]
    PageFailed { page: u32, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered page image backed by a private scratch directory.
///
/// The image file and its directory are deleted when this value is dropped.
#[derive(Debug)]
pub struct RasterPage {
    scratch: TempDir,
    path: PathBuf,
}

impl RasterPage {
    /// Take ownership of an image inside `scratch`.
    pub fn new(scratch: TempDir, path: PathBuf) -> Self {
        Self { scratch, path }
    }

    /// Path to the rendered image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the rendered image.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Rasterizes document pages.
///
/// Page numbers are 1-based.
pub trait PageRenderer: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, document: &Document) -> Result<u32, RenderError>;

    /// Render a single page into a fresh scratch directory.
    fn render_page(&self, document: &Document, page: u32) -> Result<RasterPage, RenderError>;
}
