//! CLI parser and command dispatch.

mod check;
mod progress;
mod tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use plagiscan::config::{load_settings, ConfigError, Settings};
use plagiscan::ocr::OcrBackendType;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = "plagiscan")]
#[command(about = "Detect plagiarism across a batch of scanned documents")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every document in a directory or zip archive
    Check {
        /// Directory or .zip archive of PDFs and page images
        path: PathBuf,
        /// Similarity threshold in [0, 1]; pairs scoring above it are flagged
        #[arg(short, long, env = "PLAGISCAN_THRESHOLD")]
        threshold: Option<f64>,
        /// Number of documents extracted concurrently
        #[arg(short, long, env = "PLAGISCAN_WORKERS")]
        workers: Option<usize>,
        /// OCR backend: tesseract or ocrs
        #[arg(short, long)]
        backend: Option<String>,
        /// OCR language (e.g., eng, deu)
        #[arg(short, long)]
        language: Option<String>,
        /// OCR model or tessdata directory
        #[arg(long)]
        model_path: Option<PathBuf>,
        /// Render resolution for PDF pages
        #[arg(long)]
        dpi: Option<u32>,
        /// Ignore very frequent characters as match anchors on long texts
        #[arg(long)]
        autojunk: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Check if required rendering and OCR tools are installed
    Tools,
}

/// CLI values that override the config file.
#[derive(Debug, Default)]
struct Overrides {
    threshold: Option<f64>,
    workers: Option<usize>,
    backend: Option<String>,
    language: Option<String>,
    model_path: Option<PathBuf>,
    dpi: Option<u32>,
    autojunk: bool,
}

impl Overrides {
    fn apply(self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(backend) = self.backend {
            settings.backend = OcrBackendType::from_str(&backend)
                .ok_or(ConfigError::UnknownBackend(backend))?;
        }
        if let Some(language) = self.language {
            settings.language = language;
        }
        if let Some(model_path) = self.model_path {
            settings.model_path = Some(model_path);
        }
        if let Some(dpi) = self.dpi {
            settings.dpi = dpi;
        }
        if self.autojunk {
            settings.autojunk = true;
        }
        settings.validate()
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Check {
            path,
            threshold,
            workers,
            backend,
            language,
            model_path,
            dpi,
            autojunk,
            format,
            no_progress,
        } => {
            let overrides = Overrides {
                threshold,
                workers,
                backend,
                language,
                model_path,
                dpi,
                autojunk,
            };
            overrides.apply(&mut settings)?;
            check::cmd_check(&settings, &path, format, !no_progress).await
        }
        Commands::Tools => tools::cmd_tools(&settings),
    }
}
