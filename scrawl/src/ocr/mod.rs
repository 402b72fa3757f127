//! Handwriting OCR
//!
//! Two recognition paths share this module:
//! - `AzureReadClient` submits the raw document to the cloud Read API and
//!   polls the resulting operation until it reaches a terminal status.
//! - `TesseractRecognizer` runs offline on a raster produced by
//!   `HandwritingPreprocessor` (grayscale, 2x upscale, bilateral denoise,
//!   adaptive threshold).
//!
//! Each path sits behind a trait (`RemoteRecognizer`, `ImagePreprocessor`,
//! `LocalRecognizer`) so the router can be driven by test doubles.
//!
//! # Usage
//!
//! ```rust,ignore
//! let preprocessor = HandwritingPreprocessor::new(&config.preprocessing);
//! let recognizer = TesseractRecognizer::new(&config.local_ocr);
//! let image = preprocessor.preprocess(&bytes)?;
//! let paragraphs = recognizer.recognize(&image).await?;
//! ```

mod local;
mod preprocessing;
mod remote;

pub use local::{LocalRecognizer, TesseractRecognizer};
pub use preprocessing::{
    preprocess_image, HandwritingPreprocessor, ImagePreprocessor, PreprocessedImage,
};
pub use remote::{AzureReadClient, JobStatus, RemoteRecognizer};
