//! OCR backend abstraction.
//!
//! Supports multiple OCR engines behind one trait:
//! - Tesseract: Traditional OCR via command-line (CPU)
//! - Ocrs: Pure Rust OCR engine (CPU, feature `ocr-ocrs`)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    Tesseract,
    /// Pure Rust OCR engine (ocrs crate).
    Ocrs,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Ocrs => "ocrs",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "ocrs" => Some(OcrBackendType::Ocrs),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
///
/// Implementations hold whatever expensive state the engine needs (loaded
/// models, resolved binaries) and must be usable from several worker threads
/// at once through `&self`.
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (dependencies installed, models present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Recognize text in a raster image.
    ///
    /// Returns the recognized text tokens (lines or words) in best-effort
    /// reading order. Geometry and confidence data are not reported.
    fn recognize(&self, image_path: &Path) -> Result<Vec<String>, OcrError>;
}

/// Configuration for OCR backends.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "chi_sim").
    pub language: String,
    /// Path to model files (for backends that need them).
    pub model_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            model_path: None,
        }
    }
}

/// Shared handle to an initialized OCR engine.
///
/// Built once per batch run and cloned into every extraction worker. The
/// engine is torn down when the last clone is dropped.
#[derive(Clone)]
pub struct OcrEngine {
    backend: Arc<dyn OcrBackend>,
}

impl OcrEngine {
    /// Wrap an already-constructed backend.
    pub fn new(backend: impl OcrBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Construct and validate the backend selected by `backend_type`.
    pub fn open(backend_type: OcrBackendType, config: OcrConfig) -> Result<Self, OcrError> {
        let engine = match backend_type {
            OcrBackendType::Tesseract => Self::new(super::TesseractBackend::with_config(config)),
            #[cfg(feature = "ocr-ocrs")]
            OcrBackendType::Ocrs => Self::new(super::OcrsBackend::load(config)?),
            #[cfg(not(feature = "ocr-ocrs"))]
            OcrBackendType::Ocrs => {
                return Err(OcrError::BackendNotAvailable(
                    "ocrs support not compiled (enable the ocr-ocrs feature)".to_string(),
                ))
            }
        };

        if !engine.backend.is_available() {
            return Err(OcrError::BackendNotAvailable(
                engine.backend.availability_hint(),
            ));
        }

        tracing::info!("OCR engine ready: {}", engine.backend_type());
        Ok(engine)
    }

    pub fn backend_type(&self) -> OcrBackendType {
        self.backend.backend_type()
    }

    /// Run OCR on an image, returning its tokens.
    pub fn recognize(&self, image_path: &Path) -> Result<Vec<String>, OcrError> {
        self.backend.recognize(image_path)
    }
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine")
            .field("backend", &self.backend.backend_type())
            .finish()
    }
}
