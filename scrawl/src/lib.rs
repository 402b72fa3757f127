//! Text extraction for printed and handwritten documents.
//!
//! Printed files go through structural parsers (Office formats, CSV, plain
//! text, PDF text layers). Handwritten images go to a cloud Read service
//! first and fall back to a local Tesseract pipeline when it is unavailable.
//!
//! ```rust,ignore
//! let router = ExtractionRouter::from_config(&Config::from_env())?;
//! let text = router
//!     .extract(&ExtractionRequest::from_flag("notes.jpg", true))
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod processing;
pub mod router;

pub use config::Config;
pub use error::{Result, ScrawlError};
pub use models::{DocumentKind, ExtractionRequest};
pub use router::{route, ExtractionRouter, ExtractionStrategy};
