//! Batch runner: extract every document, then classify the batch.
//!
//! Separated from UI concerns - emits events for progress tracking.

mod types;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::ConfigError;
use crate::extract::TextExtractor;
use crate::models::Document;
use crate::similarity::{Classifier, ClassifyError};

pub use types::{BatchEvent, BatchReport, CancelHandle, ExtractionOutcome, ExtractionStatus};

/// Errors that stop a batch run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No eligible documents found")]
    EmptyBatch,

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Options controlling a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub threshold: f64,
    /// Documents extracted concurrently; 1 runs them one after another.
    pub workers: usize,
    pub autojunk: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threshold: crate::similarity::DEFAULT_THRESHOLD,
            workers: 1,
            autojunk: false,
        }
    }
}

/// Runs the extraction and classification stages over one batch.
pub struct BatchRunner {
    extractor: TextExtractor,
    classifier: Classifier,
    workers: usize,
    cancel: CancelHandle,
}

impl BatchRunner {
    /// Validate options and build a runner around an extractor.
    pub fn new(extractor: TextExtractor, options: BatchOptions) -> Result<Self, PipelineError> {
        if options.workers == 0 {
            return Err(ConfigError::InvalidWorkers.into());
        }
        let classifier = Classifier::new(options.threshold)
            .map_err(|_| ConfigError::InvalidThreshold(options.threshold))?
            .with_autojunk(options.autojunk)
            .with_workers(options.workers);

        Ok(Self {
            extractor,
            classifier,
            workers: options.workers,
            cancel: CancelHandle::new(),
        })
    }

    /// Handle that skips the remaining documents when cancelled.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Extract every document and classify the batch.
    pub async fn run(
        &self,
        documents: &[Document],
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Result<BatchReport, PipelineError> {
        if documents.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        let (texts, outcomes) = self.extract_all(documents, &event_tx).await?;
        let names: Vec<String> = documents.iter().map(|d| d.name.clone()).collect();

        let n = documents.len();
        let _ = event_tx
            .send(BatchEvent::ClassificationStarted {
                comparisons: n * (n - 1) / 2,
            })
            .await;

        let classifier = self.classifier.clone();
        let result =
            tokio::task::spawn_blocking(move || classifier.classify(&texts, &names)).await??;

        let _ = event_tx
            .send(BatchEvent::ClassificationComplete {
                flagged: result.flagged_pairs.len(),
            })
            .await;

        tracing::info!(
            "Batch complete: {} documents, {} flagged pairs, {} clear",
            n,
            result.flagged_pairs.len(),
            result.clear_documents.len()
        );

        Ok(BatchReport {
            generated_at: chrono::Utc::now(),
            threshold: self.classifier.threshold(),
            documents: outcomes,
            result,
        })
    }

    /// Extraction stage.
    ///
    /// Returns texts and outcomes index-aligned with `documents`, whatever
    /// order the workers finish in.
    async fn extract_all(
        &self,
        documents: &[Document],
        event_tx: &mpsc::Sender<BatchEvent>,
    ) -> Result<(Vec<String>, Vec<ExtractionOutcome>), PipelineError> {
        let total = documents.len();
        let _ = event_tx
            .send(BatchEvent::ExtractionStarted {
                total_documents: total,
            })
            .await;

        let mut slots: Vec<Option<(String, ExtractionOutcome)>> = vec![None; total];
        let mut tasks: JoinSet<(usize, String, ExtractionOutcome)> = JoinSet::new();

        for (index, document) in documents.iter().enumerate() {
            while tasks.len() >= self.workers {
                if let Some(joined) = tasks.join_next().await {
                    let (i, text, outcome) = joined?;
                    report_outcome(event_tx, i, &outcome).await;
                    slots[i] = Some((text, outcome));
                }
            }

            if self.cancel.is_cancelled() {
                let _ = event_tx
                    .send(BatchEvent::DocumentSkipped {
                        index,
                        name: document.name.clone(),
                    })
                    .await;
                slots[index] = Some((
                    String::new(),
                    ExtractionOutcome::cancelled(&document.name),
                ));
                continue;
            }

            let _ = event_tx
                .send(BatchEvent::DocumentStarted {
                    index,
                    name: document.name.clone(),
                })
                .await;

            let extractor = self.extractor.clone();
            let document = document.clone();
            tasks.spawn_blocking(move || {
                let (text, outcome) = extract_isolated(&extractor, &document);
                (index, text, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (i, text, outcome) = joined?;
            report_outcome(event_tx, i, &outcome).await;
            slots[i] = Some((text, outcome));
        }

        let mut texts = Vec::with_capacity(total);
        let mut outcomes = Vec::with_capacity(total);
        for (slot, document) in slots.into_iter().zip(documents) {
            let (text, outcome) = slot.unwrap_or_else(|| {
                (String::new(), ExtractionOutcome::cancelled(&document.name))
            });
            texts.push(text);
            outcomes.push(outcome);
        }

        let count = |status: ExtractionStatus| {
            outcomes.iter().filter(|o| o.status == status).count()
        };
        let _ = event_tx
            .send(BatchEvent::ExtractionComplete {
                succeeded: count(ExtractionStatus::Extracted),
                failed: count(ExtractionStatus::Failed),
                skipped: count(ExtractionStatus::Cancelled),
            })
            .await;

        Ok((texts, outcomes))
    }
}

/// Extract one document on a worker thread.
///
/// Failures and panics both become empty text with a failed outcome.
fn extract_isolated(
    extractor: &TextExtractor,
    document: &Document,
) -> (String, ExtractionOutcome) {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| extractor.extract_or_empty(document)));
    match attempt {
        Ok((extracted, None)) => {
            let outcome =
                ExtractionOutcome::extracted(&document.name, extracted.pages, &extracted.text);
            (extracted.text, outcome)
        }
        Ok((_, Some(e))) => (
            String::new(),
            ExtractionOutcome::failed(&document.name, e.to_string()),
        ),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Extraction of {} panicked: {}", document.name, message);
            (
                String::new(),
                ExtractionOutcome::failed(
                    &document.name,
                    format!("extraction panicked: {}", message),
                ),
            )
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn report_outcome(
    event_tx: &mpsc::Sender<BatchEvent>,
    index: usize,
    outcome: &ExtractionOutcome,
) {
    let event = match outcome.status {
        ExtractionStatus::Extracted => BatchEvent::DocumentCompleted {
            index,
            name: outcome.name.clone(),
            pages: outcome.pages,
            chars: outcome.chars,
        },
        _ => BatchEvent::DocumentFailed {
            index,
            name: outcome.name.clone(),
            error: outcome.error.clone().unwrap_or_default(),
        },
    };
    let _ = event_tx.send(event).await;
}
