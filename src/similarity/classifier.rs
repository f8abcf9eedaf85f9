//! Pairwise classification of a batch into flagged pairs and clear documents.

use std::collections::HashSet;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::matcher::ratio_chars;

/// Default similarity threshold above which a pair is flagged.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Errors from classification input validation.
#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("Threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("{texts} texts but {names} names")]
    LengthMismatch { texts: usize, names: usize },
}

/// Similarity of one unordered document pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityPair {
    pub name_a: String,
    pub name_b: String,
    pub score: f64,
}

impl SimilarityPair {
    /// Score as a percentage in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        self.score * 100.0
    }
}

/// Serialized as a `(name_a, name_b, percentage)` triple.
impl Serialize for SimilarityPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.name_a, &self.name_b, self.percentage()).serialize(serializer)
    }
}

/// Outcome of classifying a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Pairs scoring strictly above the threshold, in `(i, j)` ascending order.
    pub flagged_pairs: Vec<SimilarityPair>,
    /// Documents absent from every flagged pair, in input order.
    pub clear_documents: Vec<String>,
    /// Number of pair evaluations performed.
    pub comparisons: usize,
}

impl ClassificationResult {
    /// Whether `name` is part of at least one flagged pair.
    pub fn is_flagged(&self, name: &str) -> bool {
        self.flagged_pairs
            .iter()
            .any(|p| p.name_a == name || p.name_b == name)
    }
}

/// Scores every unordered pair of a batch.
#[derive(Debug, Clone)]
pub struct Classifier {
    threshold: f64,
    autojunk: bool,
    workers: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            autojunk: false,
            workers: 1,
        }
    }
}

impl Classifier {
    /// Create a classifier, rejecting thresholds outside `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self, ClassifyError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ClassifyError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            ..Self::default()
        })
    }

    /// Enable the matcher's popular-character heuristic.
    pub fn with_autojunk(mut self, autojunk: bool) -> Self {
        self.autojunk = autojunk;
        self
    }

    /// Spread pair evaluation over `workers` threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score all pairs and partition the batch.
    ///
    /// `texts` and `names` are index-aligned.
    pub fn classify(
        &self,
        texts: &[String],
        names: &[String],
    ) -> Result<ClassificationResult, ClassifyError> {
        if texts.len() != names.len() {
            return Err(ClassifyError::LengthMismatch {
                texts: texts.len(),
                names: names.len(),
            });
        }

        let sequences: Vec<Vec<char>> = texts.iter().map(|t| t.chars().collect()).collect();
        let pairs = pair_indices(sequences.len());
        let scores = self.score_pairs(&sequences, &pairs);

        let flagged_pairs: Vec<SimilarityPair> = pairs
            .iter()
            .zip(&scores)
            .filter(|(_, score)| **score > self.threshold)
            .map(|(&(i, j), &score)| SimilarityPair {
                name_a: names[i].clone(),
                name_b: names[j].clone(),
                score,
            })
            .collect();

        let flagged_names: HashSet<&str> = flagged_pairs
            .iter()
            .flat_map(|p| [p.name_a.as_str(), p.name_b.as_str()])
            .collect();
        let clear_documents = names
            .iter()
            .filter(|name| !flagged_names.contains(name.as_str()))
            .cloned()
            .collect();

        tracing::debug!(
            "Classified {} documents: {} comparisons, {} flagged pairs",
            names.len(),
            scores.len(),
            flagged_pairs.len()
        );

        Ok(ClassificationResult {
            flagged_pairs,
            clear_documents,
            comparisons: scores.len(),
        })
    }

    /// Ratios for `pairs`, returned in the same order.
    fn score_pairs(&self, sequences: &[Vec<char>], pairs: &[(usize, usize)]) -> Vec<f64> {
        let autojunk = self.autojunk;
        let score =
            move |&(i, j): &(usize, usize)| ratio_chars(&sequences[i], &sequences[j], autojunk);

        if self.workers <= 1 || pairs.len() < 2 {
            return pairs.iter().map(score).collect();
        }

        let chunk_size = pairs.len().div_ceil(self.workers);
        std::thread::scope(|scope| {
            let handles: Vec<_> = pairs
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || chunk.iter().map(score).collect::<Vec<f64>>()))
                .collect();

            // Joining in spawn order restores the canonical pair order.
            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(scores) => scores,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// Every `(i, j)` with `i < j < n`, `i` ascending then `j` ascending.
fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Classify with the default matcher settings.
pub fn classify(
    texts: &[String],
    names: &[String],
    threshold: f64,
) -> Result<ClassificationResult, ClassifyError> {
    Classifier::new(threshold)?.classify(texts, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_partition(result: &ClassificationResult, names: &[String]) {
        for name in names {
            let flagged = result.is_flagged(name);
            let clear = result.clear_documents.contains(name);
            assert!(flagged != clear, "{name} flagged={flagged} clear={clear}");
        }
    }

    #[test]
    fn test_identical_pair_flagged() {
        let texts = strings(&[
            "the quick brown fox",
            "the quick brown fox",
            "completely unrelated content here",
        ]);
        let names = strings(&["a.pdf", "b.pdf", "c.pdf"]);

        let result = classify(&texts, &names, 0.7).unwrap();
        assert_eq!(
            result.flagged_pairs,
            vec![SimilarityPair {
                name_a: "a.pdf".to_string(),
                name_b: "b.pdf".to_string(),
                score: 1.0,
            }]
        );
        assert_eq!(result.clear_documents, vec!["c.pdf"]);
        assert_eq!(result.comparisons, 3);
        assert_partition(&result, &names);
    }

    #[test]
    fn test_comparison_count() {
        for n in 0usize..8 {
            let texts: Vec<String> = (0..n).map(|i| format!("document {}", i)).collect();
            let names: Vec<String> = (0..n).map(|i| format!("{}.pdf", i)).collect();
            let result = classify(&texts, &names, 0.7).unwrap();
            assert_eq!(result.comparisons, n * n.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        // "abcd" vs "abce" scores exactly 0.75
        let texts = strings(&["abcd", "abce"]);
        let names = strings(&["x.pdf", "y.pdf"]);

        let at = classify(&texts, &names, 0.75).unwrap();
        assert!(at.flagged_pairs.is_empty());
        assert_eq!(at.clear_documents, names);

        let below = classify(&texts, &names, 0.74).unwrap();
        assert_eq!(below.flagged_pairs.len(), 1);
        assert!(below.clear_documents.is_empty());
    }

    #[test]
    fn test_failed_extraction_is_clear() {
        let texts = strings(&["", "the quick brown fox", "the quick brown fox"]);
        let names = strings(&["failed.pdf", "a.pdf", "b.pdf"]);

        let result = classify(&texts, &names, 0.7).unwrap();
        assert_eq!(result.flagged_pairs.len(), 1);
        assert_eq!(result.flagged_pairs[0].name_a, "a.pdf");
        assert_eq!(result.clear_documents, vec!["failed.pdf"]);
    }

    #[test]
    fn test_two_failed_extractions_flag_each_other() {
        let texts = strings(&["", "some real essay text", ""]);
        let names = strings(&["bad1.pdf", "good.pdf", "bad2.pdf"]);

        let result = classify(&texts, &names, 0.7).unwrap();
        assert_eq!(
            result.flagged_pairs,
            vec![SimilarityPair {
                name_a: "bad1.pdf".to_string(),
                name_b: "bad2.pdf".to_string(),
                score: 1.0,
            }]
        );
        assert_eq!(result.clear_documents, vec!["good.pdf"]);
        assert_partition(&result, &names);
    }

    #[test]
    fn test_single_document_is_clear() {
        let result = classify(&strings(&["alone"]), &strings(&["only.pdf"]), 0.7).unwrap();
        assert!(result.flagged_pairs.is_empty());
        assert_eq!(result.clear_documents, vec!["only.pdf"]);
        assert_eq!(result.comparisons, 0);
    }

    #[test]
    fn test_empty_batch() {
        let result = classify(&[], &[], 0.7).unwrap();
        assert!(result.flagged_pairs.is_empty());
        assert!(result.clear_documents.is_empty());
    }

    #[test]
    fn test_flagged_pairs_in_generation_order() {
        let texts = strings(&["same text", "same text", "same text"]);
        let names = strings(&["a", "b", "c"]);
        let result = classify(&texts, &names, 0.7).unwrap();
        let order: Vec<(&str, &str)> = result
            .flagged_pairs
            .iter()
            .map(|p| (p.name_a.as_str(), p.name_b.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let texts: Vec<String> = (0..9)
            .map(|i| {
                let topic = ["rivers", "mountains", "deserts"][i % 3];
                format!("essay number {} about {}", i % 3, topic)
            })
            .collect();
        let names: Vec<String> = (0..9).map(|i| format!("{}.pdf", i)).collect();

        let sequential = Classifier::new(0.7).unwrap().classify(&texts, &names).unwrap();
        let parallel = Classifier::new(0.7)
            .unwrap()
            .with_workers(4)
            .classify(&texts, &names)
            .unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.comparisons, 36);
    }

    #[test]
    fn test_rejects_invalid_threshold() {
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(Classifier::new(bad), Err(ClassifyError::InvalidThreshold(_))));
        }
        assert!(Classifier::new(0.0).is_ok());
        assert!(Classifier::new(1.0).is_ok());
    }

    #[test]
    fn test_rejects_misaligned_input() {
        let err = classify(&strings(&["a", "b"]), &strings(&["a.pdf"]), 0.7).unwrap_err();
        assert_eq!(err, ClassifyError::LengthMismatch { texts: 2, names: 1 });
    }

    #[test]
    fn test_pair_serializes_as_percentage_triple() {
        let pair = SimilarityPair {
            name_a: "a.pdf".to_string(),
            name_b: "b.pdf".to_string(),
            score: 0.5,
        };
        assert_eq!(serde_json::to_string(&pair).unwrap(), r#"["a.pdf","b.pdf",50.0]"#);
    }
}
