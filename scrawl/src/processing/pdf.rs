use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ScrawlError};

/// Per-page text of a born-digital PDF.
#[async_trait]
pub trait PdfTextReader: Send + Sync {
    /// One entry per page, in page order. Pages without text are `""`.
    async fn read_pages(&self, path: &Path) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractReader;

impl PdfExtractReader {
    pub fn new() -> Self {
        Self
    }

    pub fn pages_from_bytes(bytes: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ScrawlError::GenericExtraction(format!("PDF extraction failed: {e}")))
    }
}

#[async_trait]
impl PdfTextReader for PdfExtractReader {
    async fn read_pages(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = tokio::fs::read(path).await?;
        let pages = tokio::task::spawn_blocking(move || Self::pages_from_bytes(&bytes)).await??;
        debug!(pages = pages.len(), "Read PDF text layer");
        Ok(pages)
    }
}
