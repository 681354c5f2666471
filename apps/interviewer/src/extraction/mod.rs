//! Document extraction: uploaded PDF bytes to plain text.
//!
//! Extraction is CPU-bound; callers run `extract` through
//! `tokio::task::spawn_blocking` (see `extract_blocking`).

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Uploaded file is not a PDF")]
    NotPdf,

    #[error("Could not read PDF: {0}")]
    Unreadable(String),

    #[error("PDF contains no extractable text (scanned or image-only?)")]
    NoText,
}

/// Converts a document byte stream into plain text.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// `pdf-extract` backed extractor.
pub struct PdfTextExtractor;

impl DocumentExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(ExtractionError::NotPdf);
        }
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        Ok(text.trim().to_string())
    }
}

/// Runs the extractor off the async executor. A panic inside the PDF library
/// is reported as `Unreadable`; whitespace-only output is `NoText`.
pub async fn extract_blocking(
    extractor: Arc<dyn DocumentExtractor>,
    bytes: Bytes,
) -> Result<String, ExtractionError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| ExtractionError::Unreadable(format!("extractor task failed: {e}")))??;

    if text.trim().is_empty() {
        return Err(ExtractionError::NoText);
    }

    info!("Extracted {} chars from {} byte document", text.len(), size);
    debug!("Extracted text: {}", text);
    Ok(text)
}
