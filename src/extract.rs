//! Text extraction: rasterize every page and run OCR over it.

use std::sync::Arc;

use thiserror::Error;

use crate::models::Document;
use crate::ocr::{OcrEngine, OcrError};
use crate::render::{PageRenderer, RenderError};

/// Separator appended after each page's text.
pub const PAGE_SEPARATOR: char = '\n';

/// Extraction failed for a whole document.
#[derive(Debug, Error)]
pub enum DocumentReadError {
    #[error("failed to read {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: RenderError,
    },

    #[error("OCR failed on {name} page {page}: {source}")]
    Ocr {
        name: String,
        page: u32,
        #[source]
        source: OcrError,
    },
}

/// Text recovered from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub pages: u32,
}

/// Turns documents into plain text.
///
/// Holds the batch's OCR engine; cloning an extractor shares the engine.
#[derive(Clone)]
pub struct TextExtractor {
    renderer: Arc<dyn PageRenderer>,
    engine: OcrEngine,
}

impl TextExtractor {
    pub fn new(renderer: Arc<dyn PageRenderer>, engine: OcrEngine) -> Self {
        Self { renderer, engine }
    }

    /// Extract the text of every page, in page order.
    ///
    /// Each page contributes its OCR tokens joined by single spaces followed
    /// by [`PAGE_SEPARATOR`]. A document with no pages yields an empty string.
    pub fn extract(&self, document: &Document) -> Result<ExtractedDocument, DocumentReadError> {
        let pages = self
            .renderer
            .page_count(document)
            .map_err(|source| DocumentReadError::Render {
                name: document.name.clone(),
                source,
            })?;

        let mut text = String::new();
        for page in 1..=pages {
            let raster = self.renderer.render_page(document, page).map_err(|source| {
                DocumentReadError::Render {
                    name: document.name.clone(),
                    source,
                }
            })?;

            let tokens = self.engine.recognize(raster.path());
            // Scratch image goes away before the result is inspected.
            drop(raster);

            let tokens = tokens.map_err(|source| DocumentReadError::Ocr {
                name: document.name.clone(),
                page,
                source,
            })?;

            tracing::debug!(
                "{} page {}/{}: {} tokens",
                document.name,
                page,
                pages,
                tokens.len()
            );
            text.push_str(&tokens.join(" "));
            text.push(PAGE_SEPARATOR);
        }

        Ok(ExtractedDocument { text, pages })
    }

    /// Extract text, degrading any failure to an empty zero-page document.
    ///
    /// The failure is logged as a warning and handed back alongside the
    /// empty text so callers can report it.
    pub fn extract_or_empty(
        &self,
        document: &Document,
    ) -> (ExtractedDocument, Option<DocumentReadError>) {
        match self.extract(document) {
            Ok(extracted) => (extracted, None),
            Err(e) => {
                tracing::warn!("Text extraction failed: {}", e);
                (ExtractedDocument::default(), Some(e))
            }
        }
    }
}
