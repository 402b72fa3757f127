mod extractor;
mod pdf;

pub mod extractors;

pub use extractor::{GenericDocumentExtractor, StructuredDocumentExtractor};
pub use pdf::{PdfExtractReader, PdfTextReader};
