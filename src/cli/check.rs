//! The `check` command: run a batch and print the report.

use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio::sync::mpsc;

use plagiscan::batch::{BatchRunner, CancelHandle, PipelineError};
use plagiscan::config::Settings;
use plagiscan::extract::TextExtractor;
use plagiscan::ingest::DocumentSource;
use plagiscan::ocr::OcrEngine;
use plagiscan::render::PdftoppmRenderer;
use plagiscan::report::{render_json, render_text};

use super::progress;
use super::OutputFormat;

/// Exit status after a forced quit (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Remaining documents will be skipped.
    Cancelled,
    /// Stop immediately without a report.
    Quit,
}

/// First Ctrl-C cancels the batch, any later one quits.
fn on_interrupt(presses: u32, cancel: &CancelHandle) -> Interrupt {
    if presses <= 1 {
        cancel.cancel();
        Interrupt::Cancelled
    } else {
        Interrupt::Quit
    }
}

pub async fn cmd_check(
    settings: &Settings,
    path: &Path,
    format: OutputFormat,
    show_progress: bool,
) -> anyhow::Result<()> {
    let source = DocumentSource::from_path(path)?;
    if source.is_empty() {
        return Err(PipelineError::EmptyBatch.into());
    }
    // The workspace holds unpacked archive contents until the batch finishes.
    let (documents, _workspace) = source.into_documents();

    if show_progress {
        eprintln!(
            "{} Checking {} documents with {} (threshold {})",
            style("→").cyan(),
            documents.len(),
            settings.backend,
            settings.threshold
        );
    }

    let engine = OcrEngine::open(settings.backend, settings.ocr_config())?;
    let renderer = Arc::new(PdftoppmRenderer::new().with_dpi(settings.dpi));
    let extractor = TextExtractor::new(renderer, engine);
    let runner = BatchRunner::new(extractor, settings.batch_options())?;

    let cancel = runner.cancel_handle();
    let signal_task = tokio::spawn(async move {
        let mut presses = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            presses += 1;
            match on_interrupt(presses, &cancel) {
                Interrupt::Cancelled => {
                    tracing::warn!("Interrupted, skipping remaining documents");
                    eprintln!(
                        "{} Finishing documents in progress; press Ctrl-C again to quit",
                        style("!").yellow()
                    );
                }
                Interrupt::Quit => std::process::exit(INTERRUPTED_EXIT_CODE),
            }
        }
    });

    let (event_tx, event_rx) = mpsc::channel(64);
    let progress_task = tokio::spawn(progress::track(event_rx, show_progress));

    let result = runner.run(&documents, event_tx).await;
    signal_task.abort();
    let _ = progress_task.await;
    let report = result?;

    match format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}
