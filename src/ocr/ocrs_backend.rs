//! OCRS OCR backend implementation.
//!
//! Uses the ocrs crate for pure-Rust OCR without external dependencies.
//! This is a lightweight, CPU-based OCR engine.
//!
//! Models are automatically downloaded on first use from:
//! https://ocrs-models.s3-accelerate.amazonaws.com/

use std::path::{Path, PathBuf};

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::model_utils::{has_all, models_root, ModelFile};

const DETECTION_MODEL: ModelFile = ModelFile {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten",
    filename: "text-detection.rten",
    size_hint: "2.5 MB",
};

const RECOGNITION_MODEL: ModelFile = ModelFile {
    url: "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten",
    filename: "text-recognition.rten",
    size_hint: "10 MB",
};

const MODELS: &[ModelFile] = &[DETECTION_MODEL, RECOGNITION_MODEL];

/// OCRS OCR backend (pure Rust).
///
/// The detection and recognition models are loaded in [`OcrsBackend::load`]
/// and live as long as the backend. `ocrs::OcrEngine` is `Send + Sync` and
/// its methods take `&self`, so one instance serves every worker.
pub struct OcrsBackend {
    engine: ocrs::OcrEngine,
    model_dir: PathBuf,
}

impl OcrsBackend {
    /// Load models (downloading them if necessary) and build the engine.
    pub fn load(config: OcrConfig) -> Result<Self, OcrError> {
        let model_dir = ensure_models(config.model_path.as_deref())?;

        let detection_path = DETECTION_MODEL.ensure_in(&model_dir)?;
        let recognition_path = RECOGNITION_MODEL.ensure_in(&model_dir)?;

        let detection_model = rten::Model::load_file(&detection_path)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to load detection model: {}", e)))?;
        let recognition_model = rten::Model::load_file(&recognition_path)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to load recognition model: {}", e)))?;

        let engine = ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::OcrFailed(format!("Failed to create OCR engine: {}", e)))?;

        tracing::debug!("Loaded OCRS models from {:?}", model_dir);
        Ok(Self { engine, model_dir })
    }

    /// Run OCR on an image.
    fn run_ocrs(&self, image_path: &Path) -> Result<String, OcrError> {
        let img = image::open(image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to load image: {}", e)))?;
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let img_source = ocrs::ImageSource::from_bytes(rgb_img.as_raw(), (width, height))
            .map_err(|e| OcrError::ImageError(format!("Failed to convert image: {}", e)))?;

        let input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to prepare input: {}", e)))?;

        self.engine
            .get_text(&input)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to extract text: {}", e)))
    }
}

/// The configured directory if it is complete, else the default one if complete.
fn find_model_dir(configured: Option<&Path>) -> Option<PathBuf> {
    configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(std::iter::once(models_root("ocrs")))
        .find(|dir| has_all(dir, MODELS))
}

/// Ensure models are present, downloading them if necessary.
fn ensure_models(configured: Option<&Path>) -> Result<PathBuf, OcrError> {
    if let Some(dir) = find_model_dir(configured) {
        return Ok(dir);
    }

    let model_dir = configured
        .map(Path::to_path_buf)
        .unwrap_or_else(|| models_root("ocrs"));
    std::fs::create_dir_all(&model_dir)?;
    for model in MODELS {
        model.ensure_in(&model_dir)?;
    }
    Ok(model_dir)
}

impl OcrBackend for OcrsBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Ocrs
    }

    fn is_available(&self) -> bool {
        has_all(&self.model_dir, MODELS)
    }

    fn availability_hint(&self) -> String {
        format!("OCRS models loaded from {:?}", self.model_dir)
    }

    fn recognize(&self, image_path: &Path) -> Result<Vec<String>, OcrError> {
        let text = self.run_ocrs(image_path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Describe where OCRS models would be loaded from, without loading them.
pub fn models_hint(configured: Option<&Path>) -> String {
    match find_model_dir(configured) {
        Some(path) => format!("OCRS models found at {:?}", path),
        None => format!(
            "OCRS models will be auto-downloaded on first use (~12 MB total) to {:?}",
            models_root("ocrs")
        ),
    }
}
