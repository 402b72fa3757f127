//! Extraction Router
//!
//! Maps an `ExtractionRequest` to one `ExtractionStrategy` and runs it.
//! Handwritten images try the remote OCR service first and fall back to the
//! local pipeline (preprocess, then Tesseract) on a remote failure only.

mod strategy;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ScrawlError};
use crate::models::ExtractionRequest;
use crate::ocr::{
    AzureReadClient, HandwritingPreprocessor, ImagePreprocessor, LocalRecognizer,
    RemoteRecognizer, TesseractRecognizer,
};
use crate::processing::{
    GenericDocumentExtractor, PdfExtractReader, PdfTextReader, StructuredDocumentExtractor,
};

pub use strategy::{route, ExtractionStrategy};

/// Stateless beyond its collaborators; share one instance behind an `Arc`.
#[derive(Clone)]
pub struct ExtractionRouter {
    generic: Arc<dyn GenericDocumentExtractor>,
    pdf: Arc<dyn PdfTextReader>,
    remote: Option<Arc<dyn RemoteRecognizer>>,
    preprocessor: Arc<dyn ImagePreprocessor>,
    local: Arc<dyn LocalRecognizer>,
}

impl ExtractionRouter {
    pub fn new(
        generic: Arc<dyn GenericDocumentExtractor>,
        pdf: Arc<dyn PdfTextReader>,
        remote: Option<Arc<dyn RemoteRecognizer>>,
        preprocessor: Arc<dyn ImagePreprocessor>,
        local: Arc<dyn LocalRecognizer>,
    ) -> Self {
        Self {
            generic,
            pdf,
            remote,
            preprocessor,
            local,
        }
    }

    /// Wires the default implementations. Printed images share the same
    /// preprocessor and Tesseract instance as the handwriting fallback.
    pub fn from_config(config: &Config) -> Result<Self> {
        let preprocessor: Arc<dyn ImagePreprocessor> =
            Arc::new(HandwritingPreprocessor::new(&config.preprocessing));
        let local: Arc<dyn LocalRecognizer> =
            Arc::new(TesseractRecognizer::new(&config.local_ocr));

        let remote = match AzureReadClient::from_config(&config.remote_ocr)? {
            Some(client) => {
                info!(endpoint = %client.endpoint(), "Remote OCR enabled");
                Some(Arc::new(client) as Arc<dyn RemoteRecognizer>)
            }
            None => {
                info!("Remote OCR not configured; handwriting uses local OCR only");
                None
            }
        };

        let generic = StructuredDocumentExtractor::new()
            .with_image_ocr(Arc::clone(&preprocessor), Arc::clone(&local));

        Ok(Self::new(
            Arc::new(generic),
            Arc::new(PdfExtractReader::new()),
            remote,
            preprocessor,
            local,
        ))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// The strategy `extract` will run for this request, given the
    /// configured collaborators.
    pub fn plan(&self, request: &ExtractionRequest) -> Result<ExtractionStrategy> {
        let strategy = route(request.extension(), request.kind())?;
        Ok(match strategy {
            ExtractionStrategy::RemoteOcr {
                local_fallback: true,
            } if self.remote.is_none() => ExtractionStrategy::LocalOcr,
            other => other,
        })
    }

    pub async fn extract(&self, request: &ExtractionRequest) -> Result<String> {
        let strategy = self.plan(request)?;
        info!(
            path = %request.path().display(),
            extension = %request.extension(),
            kind = %request.kind(),
            strategy = %strategy,
            "Extracting text"
        );

        match strategy {
            ExtractionStrategy::GenericDocument => self.generic.extract(request.path()).await,
            ExtractionStrategy::PdfText => {
                let pages = self.pdf.read_pages(request.path()).await?;
                debug!(pages = pages.len(), "Concatenating PDF pages");
                Ok(pages.concat())
            }
            ExtractionStrategy::RemoteOcr { local_fallback } => {
                let bytes = tokio::fs::read(request.path()).await?;
                self.recognize_remote_first(bytes, request.extension(), local_fallback)
                    .await
            }
            ExtractionStrategy::LocalOcr => {
                info!("Remote OCR not configured; using local OCR");
                let bytes = tokio::fs::read(request.path()).await?;
                self.recognize_locally(bytes).await
            }
        }
    }

    async fn recognize_remote_first(
        &self,
        bytes: Vec<u8>,
        extension: &str,
        local_fallback: bool,
    ) -> Result<String> {
        let remote_error = match &self.remote {
            Some(remote) => match remote.recognize(&bytes, extension).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_remote_failure() => e,
                Err(e) => return Err(e),
            },
            None => ScrawlError::RemoteUnavailable("remote OCR is not configured".to_string()),
        };

        if !local_fallback {
            warn!(error = %remote_error, "Remote OCR failed; no local fallback for this format");
            return Err(remote_error);
        }

        warn!(error = %remote_error, "Remote OCR failed; falling back to local OCR");
        self.recognize_locally(bytes).await
    }

    /// Preprocess then recognise. Each paragraph is followed by `\n`.
    async fn recognize_locally(&self, bytes: Vec<u8>) -> Result<String> {
        let preprocessor = Arc::clone(&self.preprocessor);
        let image = tokio::task::spawn_blocking(move || preprocessor.preprocess(&bytes)).await??;

        let paragraphs = self.local.recognize(&image).await?;
        Ok(paragraphs.iter().fold(String::new(), |mut text, paragraph| {
            text.push_str(paragraph);
            text.push('\n');
            text
        }))
    }
}

impl std::fmt::Debug for ExtractionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRouter")
            .field("has_remote", &self.has_remote())
            .finish_non_exhaustive()
    }
}
