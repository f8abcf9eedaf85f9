//! Batch runner types and events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::similarity::ClassificationResult;

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Extraction stage started
    ExtractionStarted { total_documents: usize },
    /// Document extraction started
    DocumentStarted { index: usize, name: String },
    /// Document extraction completed
    DocumentCompleted {
        index: usize,
        name: String,
        pages: u32,
        chars: usize,
    },
    /// Document extraction failed; its text is empty
    DocumentFailed {
        index: usize,
        name: String,
        error: String,
    },
    /// Document skipped because the batch was cancelled
    DocumentSkipped { index: usize, name: String },
    /// Extraction stage complete
    ExtractionComplete {
        succeeded: usize,
        failed: usize,
        skipped: usize,
    },
    /// Classification started
    ClassificationStarted { comparisons: usize },
    /// Classification complete
    ClassificationComplete { flagged: usize },
}

/// How a document's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Extracted,
    Failed,
    Cancelled,
}

/// Per-document extraction summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub name: String,
    pub status: ExtractionStatus,
    pub pages: u32,
    /// Length of the extracted text in characters.
    pub chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    pub(crate) fn extracted(name: &str, pages: u32, text: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ExtractionStatus::Extracted,
            pages,
            chars: text.chars().count(),
            error: None,
        }
    }

    pub(crate) fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: ExtractionStatus::Failed,
            pages: 0,
            chars: 0,
            error: Some(error),
        }
    }

    pub(crate) fn cancelled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: ExtractionStatus::Cancelled,
            pages: 0,
            chars: 0,
            error: Some("cancelled".to_string()),
        }
    }

    /// Whether the document contributed empty text because of a failure or cancellation.
    pub fn is_degraded(&self) -> bool {
        self.status != ExtractionStatus::Extracted
    }
}

/// Result of a complete batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    /// One entry per document, in batch order.
    pub documents: Vec<ExtractionOutcome>,
    #[serde(flatten)]
    pub result: ClassificationResult,
}

impl BatchReport {
    /// Documents whose extraction failed or was skipped.
    pub fn degraded(&self) -> impl Iterator<Item = &ExtractionOutcome> {
        self.documents.iter().filter(|d| d.is_degraded())
    }
}

/// External cancellation control for a running batch.
///
/// Cancellation takes effect between documents: an extraction already in
/// progress finishes, remaining documents are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
