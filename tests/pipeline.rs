//! End-to-end batch runs through the public API with fake rendering and OCR.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tokio::sync::mpsc;

use plagiscan::batch::{BatchEvent, BatchOptions, BatchRunner, CancelHandle, ExtractionStatus};
use plagiscan::config::ConfigError;
use plagiscan::extract::TextExtractor;
use plagiscan::models::{Document, DocumentKind};
use plagiscan::ocr::{OcrBackend, OcrBackendType, OcrEngine, OcrError};
use plagiscan::render::{PageRenderer, RasterPage, RenderError};
use plagiscan::PipelineError;

/// Treats each document as a text file whose pages are separated by form feeds.
struct TextPageRenderer;

impl TextPageRenderer {
    fn pages(document: &Document) -> Result<Vec<String>, RenderError> {
        let content = std::fs::read_to_string(&document.path)?;
        if content.starts_with("CORRUPT") {
            return Err(RenderError::Unreadable(document.name.clone()));
        }
        if content.is_empty() {
            return Ok(Vec::new());
        }
        Ok(content.split('\u{c}').map(str::to_string).collect())
    }
}

impl PageRenderer for TextPageRenderer {
    fn page_count(&self, document: &Document) -> Result<u32, RenderError> {
        Ok(Self::pages(document)?.len() as u32)
    }

    fn render_page(&self, document: &Document, page: u32) -> Result<RasterPage, RenderError> {
        let pages = Self::pages(document)?;
        let text = pages
            .get(page as usize - 1)
            .ok_or_else(|| RenderError::PageFailed {
                page,
                reason: "out of range".to_string(),
            })?;
        let scratch = TempDir::new()?;
        let path = scratch.path().join("page.png");
        std::fs::write(&path, text)?;
        Ok(RasterPage::new(scratch, path))
    }
}

/// Splits the fake page image into words and counts every call.
#[derive(Default)]
struct WordsOcr {
    calls: Arc<AtomicUsize>,
    cancel_on: Option<&'static str>,
    cancel: Arc<Mutex<Option<CancelHandle>>>,
    panic_on: Option<&'static str>,
}

impl OcrBackend for WordsOcr {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        "always available".to_string()
    }

    fn recognize(&self, image_path: &Path) -> Result<Vec<String>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = std::fs::read_to_string(image_path)?;
        if Some(content.as_str()) == self.panic_on {
            panic!("decoder bug on malformed image");
        }
        if Some(content.as_str()) == self.cancel_on {
            if let Some(handle) = self.cancel.lock().unwrap().as_ref() {
                handle.cancel();
            }
        }
        Ok(content.split_whitespace().map(str::to_string).collect())
    }
}

struct Batch {
    _dir: TempDir,
    documents: Vec<Document>,
}

fn batch(files: &[(&str, &str)]) -> Batch {
    let dir = TempDir::new().unwrap();
    let documents = files
        .iter()
        .map(|(name, content)| {
            let path: PathBuf = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            Document::new(*name, path, DocumentKind::Pdf)
        })
        .collect();
    Batch {
        _dir: dir,
        documents,
    }
}

fn runner(ocr: WordsOcr, workers: usize) -> BatchRunner {
    let extractor = TextExtractor::new(Arc::new(TextPageRenderer), OcrEngine::new(ocr));
    BatchRunner::new(
        extractor,
        BatchOptions {
            workers,
            ..BatchOptions::default()
        },
    )
    .unwrap()
}

fn sample_batch() -> Batch {
    batch(&[
        ("a.pdf", "the quick brown fox\u{c}jumps over the lazy dog"),
        ("b.pdf", "the quick brown fox\u{c}jumps over the lazy dog"),
        ("c.pdf", "completely unrelated content here"),
        ("d.pdf", "CORRUPT"),
        ("e.pdf", "an essay on photosynthesis in plants"),
    ])
}

#[tokio::test]
async fn failed_document_keeps_alignment_and_is_clear() {
    let batch = sample_batch();
    let (tx, _rx) = mpsc::channel(256);
    let report = runner(WordsOcr::default(), 1)
        .run(&batch.documents, tx)
        .await
        .unwrap();

    let names: Vec<&str> = report.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf", "d.pdf", "e.pdf"]);
    assert_eq!(report.documents[3].status, ExtractionStatus::Failed);
    assert_eq!(report.documents[0].pages, 2);

    assert_eq!(report.result.comparisons, 10);
    assert_eq!(report.result.flagged_pairs.len(), 1);
    let pair = &report.result.flagged_pairs[0];
    assert_eq!((pair.name_a.as_str(), pair.name_b.as_str()), ("a.pdf", "b.pdf"));
    assert_eq!(pair.score, 1.0);
    assert_eq!(report.result.clear_documents, vec!["c.pdf", "d.pdf", "e.pdf"]);
    assert_eq!(report.degraded().count(), 1);
}

#[tokio::test]
async fn parallel_run_matches_sequential_run() {
    let batch = sample_batch();

    let (tx, _rx) = mpsc::channel(256);
    let sequential = runner(WordsOcr::default(), 1)
        .run(&batch.documents, tx)
        .await
        .unwrap();

    let (tx, _rx) = mpsc::channel(256);
    let parallel = runner(WordsOcr::default(), 4)
        .run(&batch.documents, tx)
        .await
        .unwrap();

    assert_eq!(sequential.result, parallel.result);
    assert_eq!(sequential.documents, parallel.documents);
}

#[tokio::test]
async fn one_engine_serves_every_page() {
    let batch = sample_batch();
    let calls = Arc::new(AtomicUsize::new(0));
    let ocr = WordsOcr {
        calls: calls.clone(),
        ..WordsOcr::default()
    };

    let (tx, _rx) = mpsc::channel(256);
    runner(ocr, 3).run(&batch.documents, tx).await.unwrap();

    // a and b have two pages each, c and e one each, d fails before OCR.
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn cancelled_before_run_skips_everything() {
    let batch = sample_batch();
    let runner = runner(WordsOcr::default(), 2);
    runner.cancel_handle().cancel();

    let (tx, mut rx) = mpsc::channel(256);
    let report = runner.run(&batch.documents, tx).await.unwrap();

    assert!(report
        .documents
        .iter()
        .all(|d| d.status == ExtractionStatus::Cancelled));
    // Every text is empty, so every pair is identical.
    assert_eq!(report.result.flagged_pairs.len(), 10);

    let mut skipped = 0;
    while let Some(event) = rx.recv().await {
        if let BatchEvent::DocumentSkipped { .. } = event {
            skipped += 1;
        }
    }
    assert_eq!(skipped, 5);
}

#[tokio::test]
async fn cancel_mid_run_skips_remaining_documents() {
    let batch = sample_batch();
    let slot = Arc::new(Mutex::new(None));
    let ocr = WordsOcr {
        cancel_on: Some("completely unrelated content here"),
        cancel: slot.clone(),
        ..WordsOcr::default()
    };
    let runner = runner(ocr, 1);
    *slot.lock().unwrap() = Some(runner.cancel_handle());

    let (tx, _rx) = mpsc::channel(256);
    let report = runner.run(&batch.documents, tx).await.unwrap();

    let statuses: Vec<ExtractionStatus> = report.documents.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExtractionStatus::Extracted,
            ExtractionStatus::Extracted,
            ExtractionStatus::Extracted,
            ExtractionStatus::Cancelled,
            ExtractionStatus::Cancelled,
        ]
    );
}

#[tokio::test]
async fn panicking_backend_fails_only_that_document() {
    let batch = batch(&[
        ("a.pdf", "the quick brown fox"),
        ("bad.pdf", "first page\u{c}malformed scan"),
        ("c.pdf", "the quick brown fox"),
    ]);
    let ocr = WordsOcr {
        panic_on: Some("malformed scan"),
        ..WordsOcr::default()
    };

    let (tx, mut rx) = mpsc::channel(256);
    let report = runner(ocr, 2).run(&batch.documents, tx).await.unwrap();

    let bad = &report.documents[1];
    assert_eq!(bad.name, "bad.pdf");
    assert_eq!(bad.status, ExtractionStatus::Failed);
    assert!(bad.error.as_deref().unwrap().contains("panicked"));
    assert_eq!(report.documents[0].status, ExtractionStatus::Extracted);
    assert_eq!(report.documents[2].status, ExtractionStatus::Extracted);

    assert_eq!(report.result.flagged_pairs.len(), 1);
    assert_eq!(report.result.flagged_pairs[0].name_a, "a.pdf");
    assert_eq!(report.result.flagged_pairs[0].name_b, "c.pdf");
    assert_eq!(report.result.clear_documents, vec!["bad.pdf"]);

    let mut failed_events = 0;
    while let Some(event) = rx.recv().await {
        if let BatchEvent::DocumentFailed { name, .. } = event {
            assert_eq!(name, "bad.pdf");
            failed_events += 1;
        }
    }
    assert_eq!(failed_events, 1);
}

#[tokio::test]
async fn empty_batch_is_an_error() {
    let (tx, _rx) = mpsc::channel(8);
    let err = runner(WordsOcr::default(), 1)
        .run(&[], tx)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyBatch));
}

#[tokio::test]
async fn events_bracket_each_stage() {
    let batch = batch(&[("x.png", "solo page")]);
    let (tx, mut rx) = mpsc::channel(256);
    let report = runner(WordsOcr::default(), 1)
        .run(&batch.documents, tx)
        .await
        .unwrap();
    assert_eq!(report.result.clear_documents, vec!["x.png"]);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(
        events.first(),
        Some(BatchEvent::ExtractionStarted { total_documents: 1 })
    ));
    assert!(events.iter().any(|e| matches!(
        e,
        BatchEvent::ExtractionComplete {
            succeeded: 1,
            failed: 0,
            skipped: 0
        }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, BatchEvent::ClassificationStarted { comparisons: 0 })));
    assert!(matches!(
        events.last(),
        Some(BatchEvent::ClassificationComplete { flagged: 0 })
    ));
}

#[test]
fn invalid_options_are_configuration_errors() {
    let extractor = || {
        TextExtractor::new(
            Arc::new(TextPageRenderer),
            OcrEngine::new(WordsOcr::default()),
        )
    };

    let err = BatchRunner::new(
        extractor(),
        BatchOptions {
            threshold: 1.5,
            ..BatchOptions::default()
        },
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        PipelineError::Configuration(ConfigError::InvalidThreshold(_))
    ));

    let err = BatchRunner::new(
        extractor(),
        BatchOptions {
            workers: 0,
            ..BatchOptions::default()
        },
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        PipelineError::Configuration(ConfigError::InvalidWorkers)
    ));
}
