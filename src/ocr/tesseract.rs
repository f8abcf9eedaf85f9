//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! This is the traditional, widely-available OCR option.

use std::path::Path;
use std::process::Command;

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::model_utils::{check_binary, TESSERACT_NOT_FOUND};

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let mut command = Command::new("tesseract");
        command
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language]);
        if let Some(ref tessdata) = self.config.model_path {
            command.arg("--tessdata-dir").arg(tessdata);
        }

        match command.output() {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Split Tesseract's plain-text output into line tokens.
///
/// Tesseract separates paragraphs with blank lines and ends each page with a
/// form feed; both carry layout only and are dropped.
fn line_tokens(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '\u{c}'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn recognize(&self, image_path: &Path) -> Result<Vec<String>, OcrError> {
        let stdout = self.run_tesseract(image_path)?;
        Ok(line_tokens(&stdout))
    }
}
