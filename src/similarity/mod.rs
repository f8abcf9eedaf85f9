//! Text similarity scoring and batch classification.

mod classifier;
mod matcher;

pub use classifier::{
    classify, ClassificationResult, Classifier, ClassifyError, SimilarityPair, DEFAULT_THRESHOLD,
};
pub use matcher::{ratio_chars, similarity_ratio, Match, SequenceMatcher};
