use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Raster formats accepted on both the printed and handwritten paths.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

/// Structured formats handled by the generic document extractor.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "docx", "xlsx", "xlsm", "xls", "ods", "csv", "pptx", "txt", "md", "text",
];

pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&extension)
}

/// How the text in a document was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Printed,
    Handwritten,
}

impl DocumentKind {
    pub fn from_handwritten(hand_written: bool) -> Self {
        if hand_written {
            DocumentKind::Handwritten
        } else {
            DocumentKind::Printed
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Printed => write!(f, "printed"),
            DocumentKind::Handwritten => write!(f, "handwritten"),
        }
    }
}

/// A single extraction job.
///
/// The extension is captured once at construction (lower-cased, no leading
/// dot) and every routing decision reads this captured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    path: PathBuf,
    kind: DocumentKind,
    extension: String,
}

impl ExtractionRequest {
    pub fn new(path: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            path,
            kind,
            extension,
        }
    }

    pub fn from_flag(path: impl Into<PathBuf>, hand_written: bool) -> Self {
        Self::new(path, DocumentKind::from_handwritten(hand_written))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lowercased_without_dot() {
        let request = ExtractionRequest::new("notes/Lecture.JPEG", DocumentKind::Handwritten);
        assert_eq!(request.extension(), "jpeg");
        assert_eq!(request.kind(), DocumentKind::Handwritten);
        assert_eq!(request.path(), Path::new("notes/Lecture.JPEG"));
    }

    #[test]
    fn test_missing_extension_is_empty() {
        let request = ExtractionRequest::new("README", DocumentKind::Printed);
        assert_eq!(request.extension(), "");
    }

    #[test]
    fn test_only_last_extension_counts() {
        let request = ExtractionRequest::new("archive.tar.gz", DocumentKind::Printed);
        assert_eq!(request.extension(), "gz");
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(
            ExtractionRequest::from_flag("a.png", true).kind(),
            DocumentKind::Handwritten
        );
        assert_eq!(
            ExtractionRequest::from_flag("a.docx", false).kind(),
            DocumentKind::Printed
        );
    }

    #[test]
    fn test_extension_tables_are_disjoint() {
        assert!(is_image_extension("tiff"));
        assert!(!is_image_extension("TIFF"));
        assert!(!is_image_extension("pdf"));
        for ext in DOCUMENT_EXTENSIONS {
            assert!(!is_image_extension(ext), "{ext} listed twice");
        }
    }

    #[test]
    fn test_kind_serde_roundtrip_names() {
        let json = serde_json::to_string(&DocumentKind::Handwritten).unwrap();
        assert_eq!(json, "\"handwritten\"");
        assert_eq!(DocumentKind::Printed.to_string(), "printed");
    }
}
