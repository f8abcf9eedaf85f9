//! Tool lookup and OCR model files.
//!
//! External tools are found on `PATH`. Model files for the `ocr-ocrs`
//! backend live under `<data dir>/plagiscan/models/<backend>` unless a model
//! directory is configured.

#[cfg(feature = "ocr-ocrs")]
use std::path::{Path, PathBuf};
#[cfg(feature = "ocr-ocrs")]
use std::process::Command;

#[cfg(feature = "ocr-ocrs")]
use super::backend::OcrError;

pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub const PDFINFO_NOT_FOUND: &str = "pdfinfo not found (install poppler-utils)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// A downloadable model file.
#[cfg(feature = "ocr-ocrs")]
pub struct ModelFile {
    pub url: &'static str,
    pub filename: &'static str,
    /// Approximate download size, for log messages.
    pub size_hint: &'static str,
}

#[cfg(feature = "ocr-ocrs")]
impl ModelFile {
    /// Download into `dir` unless already present; returns the file path.
    pub fn ensure_in(&self, dir: &Path) -> Result<PathBuf, OcrError> {
        let dest = dir.join(self.filename);
        if !dest.exists() {
            tracing::info!("Downloading {} (~{})", self.filename, self.size_hint);
            fetch(self.url, &dest)?;
        }
        Ok(dest)
    }
}

/// Default model directory for a backend.
#[cfg(feature = "ocr-ocrs")]
pub fn models_root(backend: &str) -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plagiscan")
        .join("models")
        .join(backend)
}

/// Whether `dir` holds every file in `files`.
#[cfg(feature = "ocr-ocrs")]
pub fn has_all(dir: &Path, files: &[ModelFile]) -> bool {
    files.iter().all(|f| dir.join(f.filename).is_file())
}

/// Fetch `url` with curl. A partial download is removed on failure.
#[cfg(feature = "ocr-ocrs")]
fn fetch(url: &str, dest: &Path) -> Result<(), OcrError> {
    if !check_binary("curl") {
        return Err(OcrError::BackendNotAvailable(format!(
            "curl not found; download {} into {} manually",
            url,
            dest.parent().unwrap_or(dest).display()
        )));
    }

    let status = Command::new("curl")
        .args(["-fsSL", "-o"])
        .arg(dest)
        .arg(url)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        let _ = std::fs::remove_file(dest);
        Err(OcrError::ModelNotFound(format!("download failed: {}", url)))
    }
}
