//! Progress display driven by batch events.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use plagiscan::batch::BatchEvent;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}";

/// Consume events until the runner drops its sender.
pub async fn track(mut events: mpsc::Receiver<BatchEvent>, enabled: bool) {
    let pb = if enabled {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(bar_style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
        pb.set_style(bar_style.progress_chars("█▓░"));
    }

    while let Some(event) = events.recv().await {
        match event {
            BatchEvent::ExtractionStarted { total_documents } => {
                pb.set_length(total_documents as u64);
                pb.set_message("Extracting text...");
            }
            BatchEvent::DocumentStarted { name, .. } => {
                pb.set_message(name);
            }
            BatchEvent::DocumentCompleted { .. } | BatchEvent::DocumentSkipped { .. } => {
                pb.inc(1);
            }
            BatchEvent::DocumentFailed { name, error, .. } => {
                pb.println(format!("  {} {}: {}", style("✗").red(), name, error));
                pb.inc(1);
            }
            BatchEvent::ExtractionComplete {
                succeeded,
                failed,
                skipped,
            } => {
                pb.finish_and_clear();
                if enabled {
                    eprintln!(
                        "{} Extraction complete: {} read, {} failed, {} skipped",
                        style("✓").green(),
                        succeeded,
                        failed,
                        skipped
                    );
                }
            }
            BatchEvent::ClassificationStarted { comparisons } => {
                if enabled {
                    eprintln!("{} Comparing {} pairs", style("→").cyan(), comparisons);
                }
            }
            BatchEvent::ClassificationComplete { flagged } => {
                if enabled {
                    eprintln!("{} {} pairs above threshold", style("✓").green(), flagged);
                }
            }
        }
    }
}
