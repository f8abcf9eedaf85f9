//! Poppler-based page rendering (`pdfinfo`, `pdftoppm`).

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use super::{PageRenderer, RasterPage, RenderError};
use crate::models::{Document, DocumentKind};
use crate::ocr::model_utils::{PDFINFO_NOT_FOUND, PDFTOPPM_NOT_FOUND};

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Renders PDF pages with `pdftoppm` as 8-bit grayscale PNGs.
///
/// Raster image documents are single-page and are copied into the scratch
/// directory unchanged.
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    dpi: u32,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl PdftoppmRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    fn pdf_page_count(&self, pdf_path: &Path) -> Result<u32, RenderError> {
        let output = match Command::new("pdfinfo").arg(pdf_path).output() {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::ToolNotFound(PDFINFO_NOT_FOUND.to_string()))
            }
            Err(e) => return Err(RenderError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Unreadable(format!(
                "pdfinfo failed: {}",
                stderr.trim()
            )));
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            RenderError::Unreadable("pdfinfo reported no page count".to_string())
        })
    }

    fn render_pdf_page(&self, pdf_path: &Path, page: u32) -> Result<RasterPage, RenderError> {
        let scratch = TempDir::new()?;
        let output_prefix = scratch.path().join("page");
        let page_str = page.to_string();
        let dpi_str = self.dpi.to_string();

        let output = Command::new("pdftoppm")
            .args(["-png", "-gray", "-singlefile", "-r", &dpi_str])
            .args(["-f", &page_str, "-l", &page_str])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(o) if o.status.success() => {
                let image = output_prefix.with_extension("png");
                if image.exists() {
                    Ok(RasterPage::new(scratch, image))
                } else {
                    Err(RenderError::PageFailed {
                        page,
                        reason: "no image generated".to_string(),
                    })
                }
            }
            Ok(o) => Err(RenderError::PageFailed {
                page,
                reason: format!(
                    "pdftoppm failed: {}",
                    String::from_utf8_lossy(&o.stderr).trim()
                ),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RenderError::ToolNotFound(PDFTOPPM_NOT_FOUND.to_string()))
            }
            Err(e) => Err(RenderError::Io(e)),
        }
    }

    fn copy_image(&self, image_path: &Path) -> Result<RasterPage, RenderError> {
        let scratch = TempDir::new()?;
        let ext = image_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        let dest: PathBuf = scratch.path().join(format!("page.{}", ext));
        std::fs::copy(image_path, &dest)
            .map_err(|e| RenderError::Unreadable(format!("{}: {}", image_path.display(), e)))?;
        Ok(RasterPage::new(scratch, dest))
    }
}

/// Parse the `Pages:` line of `pdfinfo` output.
fn parse_page_count(pdfinfo_stdout: &str) -> Option<u32> {
    pdfinfo_stdout
        .lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

impl PageRenderer for PdftoppmRenderer {
    fn page_count(&self, document: &Document) -> Result<u32, RenderError> {
        match document.kind {
            DocumentKind::Pdf => self.pdf_page_count(&document.path),
            DocumentKind::Image => {
                if document.path.is_file() {
                    Ok(1)
                } else {
                    Err(RenderError::Unreadable(format!(
                        "{} is not a readable file",
                        document.path.display()
                    )))
                }
            }
        }
    }

    fn render_page(&self, document: &Document, page: u32) -> Result<RasterPage, RenderError> {
        match document.kind {
            DocumentKind::Pdf => self.render_pdf_page(&document.path, page),
            DocumentKind::Image if page == 1 => self.copy_image(&document.path),
            DocumentKind::Image => Err(RenderError::PageFailed {
                page,
                reason: "image documents have a single page".to_string(),
            }),
        }
    }
}
