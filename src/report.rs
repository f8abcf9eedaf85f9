//! Plain-text and JSON rendering of a batch report.

use std::fmt::Write;

use crate::batch::{BatchReport, ExtractionStatus};

/// Render the human-readable report.
pub fn render_text(report: &BatchReport) -> String {
    let mut out = String::new();
    let result = &report.result;

    let _ = writeln!(out, "Detected Plagiarized Files:");
    if result.flagged_pairs.is_empty() {
        let _ = writeln!(out, "No plagiarism detected among any files.");
    } else {
        for pair in &result.flagged_pairs {
            let _ = writeln!(
                out,
                "{} and {} - Similarity: {:.2}%",
                pair.name_a,
                pair.name_b,
                pair.percentage()
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Files with No Plagiarism Detected:");
    if result.clear_documents.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for name in &result.clear_documents {
        let _ = writeln!(out, "{}", name);
    }

    let degraded: Vec<_> = report.degraded().collect();
    if !degraded.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Documents Read as Empty Text:");
        for outcome in degraded {
            let label = match outcome.status {
                ExtractionStatus::Cancelled => "skipped",
                _ => "failed",
            };
            let _ = writeln!(
                out,
                "{} ({}): {}",
                outcome.name,
                label,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    out
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &BatchReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ExtractionOutcome;
    use crate::similarity::{ClassificationResult, SimilarityPair};

    fn sample(flagged: Vec<SimilarityPair>, clear: &[&str]) -> BatchReport {
        BatchReport {
            generated_at: chrono::Utc::now(),
            threshold: 0.7,
            documents: vec![
                ExtractionOutcome::extracted("a.pdf", 1, "the quick brown fox"),
                ExtractionOutcome::extracted("b.pdf", 1, "the quick brown fox"),
                ExtractionOutcome::failed("c.pdf", "corrupt xref".to_string()),
            ],
            result: ClassificationResult {
                flagged_pairs: flagged,
                clear_documents: clear.iter().map(|s| s.to_string()).collect(),
                comparisons: 3,
            },
        }
    }

    #[test]
    fn test_text_lists_pairs_and_clear_documents() {
        let report = sample(
            vec![SimilarityPair {
                name_a: "a.pdf".to_string(),
                name_b: "b.pdf".to_string(),
                score: 0.876543,
            }],
            &["c.pdf"],
        );
        let text = render_text(&report);
        assert!(text.contains("a.pdf and b.pdf - Similarity: 87.65%"));
        assert!(!text.contains("No plagiarism detected"));
        let clear_section = text.split("Files with No Plagiarism Detected:").nth(1).unwrap();
        assert!(clear_section.contains("c.pdf"));
        assert!(text.contains("c.pdf (failed): corrupt xref"));
    }

    #[test]
    fn test_text_without_flagged_pairs() {
        let report = sample(vec![], &["a.pdf", "b.pdf", "c.pdf"]);
        let text = render_text(&report);
        assert!(text.contains("No plagiarism detected among any files."));
    }

    #[test]
    fn test_json_pairs_are_triples() {
        let report = sample(
            vec![SimilarityPair {
                name_a: "a.pdf".to_string(),
                name_b: "b.pdf".to_string(),
                score: 1.0,
            }],
            &["c.pdf"],
        );
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["flagged_pairs"][0][0], "a.pdf");
        assert_eq!(value["flagged_pairs"][0][2], 100.0);
        assert_eq!(value["comparisons"], 3);
        assert_eq!(value["documents"][2]["status"], "failed");
    }
}
