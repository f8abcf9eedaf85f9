//! plagiscan - plagiarism detection for scanned document batches.
//!
//! Documents (PDFs and page images) are rasterized, read with OCR, and
//! compared pairwise with a character-level similarity ratio. Pairs scoring
//! above a threshold are flagged; every other document is reported clear.

pub mod batch;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod render;
pub mod report;
pub mod similarity;

pub use batch::{BatchEvent, BatchOptions, BatchReport, BatchRunner, CancelHandle, PipelineError};
pub use extract::{DocumentReadError, TextExtractor};
pub use models::{Document, DocumentKind};
pub use similarity::{classify, ClassificationResult, SimilarityPair};
