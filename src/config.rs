//! Configuration management for plagiscan using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::BatchOptions;
use crate::ocr::{OcrBackendType, OcrConfig};
use crate::render::DEFAULT_DPI;
use crate::similarity::DEFAULT_THRESHOLD;

/// Default number of extraction workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Configuration errors. All of them are fatal before processing starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("workers must be at least 1")]
    InvalidWorkers,

    #[error("render dpi must be at least 1")]
    InvalidDpi,

    #[error("unknown OCR backend: {0} (expected tesseract or ocrs)")]
    UnknownBackend(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// OCR section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrSection {
    /// Backend name ("tesseract" or "ocrs").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// OCR language (e.g., "eng").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Model or tessdata directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySection {
    /// Treat very frequent characters as non-anchoring when matching long texts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autojunk: Option<bool>,
}

/// File configuration. Every field is optional; unset fields keep defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Similarity threshold above which a pair is flagged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Number of documents extracted concurrently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub similarity: SimilaritySection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers plagiscan config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("plagiscan").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(
        &self,
        settings: &mut Settings,
        base_dir: &Path,
    ) -> Result<(), ConfigError> {
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(ref backend) = self.ocr.backend {
            settings.backend = OcrBackendType::from_str(backend)
                .ok_or_else(|| ConfigError::UnknownBackend(backend.clone()))?;
        }
        if let Some(ref language) = self.ocr.language {
            settings.language = language.clone();
        }
        if let Some(ref model_path) = self.ocr.model_path {
            settings.model_path = Some(self.resolve_path(model_path, base_dir));
        }
        if let Some(dpi) = self.render.dpi {
            settings.dpi = dpi;
        }
        if let Some(autojunk) = self.similarity.autojunk {
            settings.autojunk = autojunk;
        }
        Ok(())
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub threshold: f64,
    pub workers: usize,
    pub backend: OcrBackendType,
    pub language: String,
    pub model_path: Option<PathBuf>,
    pub dpi: u32,
    pub autojunk: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            workers: DEFAULT_WORKERS,
            backend: OcrBackendType::Tesseract,
            language: "eng".to_string(),
            model_path: None,
            dpi: DEFAULT_DPI,
            autojunk: false,
        }
    }
}

impl Settings {
    /// Reject invalid values before any document is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.dpi == 0 {
            return Err(ConfigError::InvalidDpi);
        }
        Ok(())
    }

    pub fn ocr_config(&self) -> OcrConfig {
        OcrConfig {
            language: self.language.clone(),
            model_path: self.model_path.clone(),
        }
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            threshold: self.threshold,
            workers: self.workers,
            autojunk: self.autojunk,
        }
    }
}

/// Load settings from an explicit config file, or from a discovered one.
pub async fn load_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or(cwd);

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;
    Ok(settings)
}
