use std::sync::Arc;

use async_trait::async_trait;
use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LocalOcrConfig;
use crate::error::{Result, ScrawlError};

use super::preprocessing::PreprocessedImage;

/// Offline recognition of a preprocessed raster into paragraph-level text.
#[async_trait]
pub trait LocalRecognizer: Send + Sync {
    async fn recognize(&self, image: &PreprocessedImage) -> Result<Vec<String>>;
}

enum TesseractBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

pub struct TesseractRecognizer {
    backend: TesseractBackend,
    language: String,
}

fn create_tesseract(config: &LocalOcrConfig) -> std::result::Result<LepTess, String> {
    LepTess::new(config.data_path.as_deref(), &config.language).map_err(|e| e.to_string())
}

impl TesseractRecognizer {
    /// Never fails: a missing engine or language pack leaves the recognizer
    /// in an unavailable state that reports itself on every call.
    pub fn new(config: &LocalOcrConfig) -> Self {
        let backend = match create_tesseract(config) {
            Ok(lt) => {
                info!(language = %config.language, "Tesseract OCR initialized");
                TesseractBackend::Local {
                    tesseract: Arc::new(Mutex::new(lt)),
                }
            }
            Err(e) => {
                let reason = format!("Tesseract not available: {e}");
                warn!("{}", reason);
                TesseractBackend::Unavailable { reason }
            }
        };

        Self {
            backend,
            language: config.language.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn unavailable(reason: &str) -> Self {
        Self {
            backend: TesseractBackend::Unavailable {
                reason: reason.to_string(),
            },
            language: "eng".to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, TesseractBackend::Unavailable { .. })
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl LocalRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &PreprocessedImage) -> Result<Vec<String>> {
        let tesseract = match &self.backend {
            TesseractBackend::Local { tesseract } => Arc::clone(tesseract),
            TesseractBackend::Unavailable { reason } => {
                return Err(ScrawlError::LocalRecognition(reason.clone()))
            }
        };

        let png = image.to_png()?;
        let raw = tokio::task::spawn_blocking(move || {
            let mut lt = tesseract.blocking_lock();
            lt.set_image_from_mem(&png)
                .map_err(|e| ScrawlError::LocalRecognition(format!("Failed to set image: {e}")))?;
            lt.get_utf8_text()
                .map_err(|e| ScrawlError::LocalRecognition(format!("Failed to extract text: {e}")))
        })
        .await??;

        let paragraphs = split_paragraphs(&raw);
        debug!(paragraphs = paragraphs.len(), "Tesseract recognition finished");

        if paragraphs.is_empty() {
            return Err(ScrawlError::LocalRecognition(
                "No text recognized in image".to_string(),
            ));
        }

        Ok(paragraphs)
    }
}

/// Blank lines separate paragraphs; whitespace inside a paragraph collapses
/// to single spaces.
pub(crate) fn split_paragraphs(raw: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(join_words(&current));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(join_words(&current));
    }

    paragraphs
}

fn join_words(lines: &[&str]) -> String {
    lines
        .iter()
        .flat_map(|l| l.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
