//! OCR module.
//!
//! Recognizes text in rasterized pages using:
//! - Tesseract OCR via the system binary (default)
//! - OCRS for pure-Rust OCR (feature: ocr-ocrs)
//!
//! Backends implement [`OcrBackend`]; the pipeline holds one [`OcrEngine`]
//! per batch run.

mod backend;
pub(crate) mod model_utils;
mod tesseract;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_backend;

pub use backend::{OcrBackend, OcrBackendType, OcrConfig, OcrEngine, OcrError};
pub use model_utils::check_binary;
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_backend::{models_hint as ocrs_models_hint, OcrsBackend};
