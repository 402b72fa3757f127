use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ScrawlError};
use crate::models::is_image_extension;
use crate::ocr::{ImagePreprocessor, LocalRecognizer};
use crate::processing::extractors::{
    CsvExtractor, DocxExtractor, PlainTextExtractor, PptxExtractor, SpreadsheetExtractor,
};

/// Text extraction for printed documents that need no handwriting OCR.
#[async_trait]
pub trait GenericDocumentExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Office formats, CSV and plain text, plus printed images when an OCR
/// pair is attached.
#[derive(Default, Clone)]
pub struct StructuredDocumentExtractor {
    image_ocr: Option<(Arc<dyn ImagePreprocessor>, Arc<dyn LocalRecognizer>)>,
}

impl StructuredDocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_ocr(
        mut self,
        preprocessor: Arc<dyn ImagePreprocessor>,
        recognizer: Arc<dyn LocalRecognizer>,
    ) -> Self {
        self.image_ocr = Some((preprocessor, recognizer));
        self
    }

    /// Dispatches non-image formats by extension.
    pub fn extract_bytes(extension: &str, bytes: &[u8]) -> Result<String> {
        match extension {
            "docx" => DocxExtractor::extract(bytes),
            "xlsx" | "xlsm" | "xls" | "ods" => SpreadsheetExtractor::extract(bytes),
            "pptx" => PptxExtractor::extract(bytes),
            "csv" => CsvExtractor::extract(bytes),
            "txt" | "md" | "text" => PlainTextExtractor::extract(bytes),
            other => Err(ScrawlError::GenericExtraction(format!(
                "No extractor for '.{other}' files"
            ))),
        }
    }

    async fn extract_image(&self, bytes: Vec<u8>) -> Result<String> {
        let (preprocessor, recognizer) = self.image_ocr.as_ref().ok_or_else(|| {
            ScrawlError::GenericExtraction("No OCR engine configured for images".to_string())
        })?;

        let preprocessor = Arc::clone(preprocessor);
        let image = tokio::task::spawn_blocking(move || preprocessor.preprocess(&bytes))
            .await?
            .map_err(|e| ScrawlError::GenericExtraction(format!("Image OCR failed: {e}")))?;

        let paragraphs = recognizer
            .recognize(&image)
            .await
            .map_err(|e| ScrawlError::GenericExtraction(format!("Image OCR failed: {e}")))?;

        Ok(paragraphs.join("\n"))
    }
}

impl std::fmt::Debug for StructuredDocumentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredDocumentExtractor")
            .field("image_ocr", &self.image_ocr.is_some())
            .finish()
    }
}

#[async_trait]
impl GenericDocumentExtractor for StructuredDocumentExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await?;
        debug!(extension = %extension, bytes = bytes.len(), "Extracting document");

        if is_image_extension(&extension) {
            return self.extract_image(bytes).await;
        }

        tokio::task::spawn_blocking(move || Self::extract_bytes(&extension, &bytes)).await?
    }
}
