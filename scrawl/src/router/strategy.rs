use std::fmt;

use serde::Serialize;

use crate::error::{Result, ScrawlError};
use crate::models::{is_image_extension, DocumentKind, DOCUMENT_EXTENSIONS};

/// The closed set of ways a file can be turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    GenericDocument,
    PdfText,
    RemoteOcr { local_fallback: bool },
    LocalOcr,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::GenericDocument => write!(f, "generic_document"),
            ExtractionStrategy::PdfText => write!(f, "pdf_text"),
            ExtractionStrategy::RemoteOcr {
                local_fallback: true,
            } => write!(f, "remote_ocr+local_fallback"),
            ExtractionStrategy::RemoteOcr {
                local_fallback: false,
            } => write!(f, "remote_ocr"),
            ExtractionStrategy::LocalOcr => write!(f, "local_ocr"),
        }
    }
}

/// Picks a strategy from the lower-cased extension and the declared kind.
///
/// | kind        | extension          | strategy                              |
/// |-------------|--------------------|---------------------------------------|
/// | printed     | `pdf`              | `PdfText`                             |
/// | printed     | document or image  | `GenericDocument`                     |
/// | handwritten | image              | `RemoteOcr { local_fallback: true }`  |
/// | handwritten | `pdf`              | `RemoteOcr { local_fallback: false }` |
///
/// Everything else is `UnsupportedFormat`.
pub fn route(extension: &str, kind: DocumentKind) -> Result<ExtractionStrategy> {
    let strategy = match kind {
        DocumentKind::Printed if extension == "pdf" => Some(ExtractionStrategy::PdfText),
        DocumentKind::Printed
            if DOCUMENT_EXTENSIONS.contains(&extension) || is_image_extension(extension) =>
        {
            Some(ExtractionStrategy::GenericDocument)
        }
        DocumentKind::Handwritten if is_image_extension(extension) => {
            Some(ExtractionStrategy::RemoteOcr {
                local_fallback: true,
            })
        }
        DocumentKind::Handwritten if extension == "pdf" => Some(ExtractionStrategy::RemoteOcr {
            local_fallback: false,
        }),
        _ => None,
    };

    strategy.ok_or_else(|| {
        let shown = if extension.is_empty() {
            "<none>".to_string()
        } else {
            format!(".{extension}")
        };
        ScrawlError::UnsupportedFormat(format!("{shown} is not supported for {kind} documents"))
    })
}
