use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrawlError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Remote OCR unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Local recognition failure: {0}")]
    LocalRecognition(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Generic extraction failure: {0}")]
    GenericExtraction(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrawlError {
    /// True for the closed set of conditions that the handwritten path
    /// recovers from by falling back to local OCR.
    pub fn is_remote_failure(&self) -> bool {
        matches!(self, ScrawlError::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for ScrawlError {
    fn from(e: reqwest::Error) -> Self {
        // Endpoint URLs stay out of error messages.
        let e = e.without_url();
        if e.is_timeout() {
            ScrawlError::RemoteUnavailable(format!("request timed out: {e}"))
        } else if e.is_decode() {
            ScrawlError::RemoteUnavailable(format!("malformed response body: {e}"))
        } else {
            ScrawlError::RemoteUnavailable(format!("HTTP request failed: {e}"))
        }
    }
}

impl From<image::ImageError> for ScrawlError {
    fn from(e: image::ImageError) -> Self {
        ScrawlError::Decode(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ScrawlError {
    fn from(e: tokio::task::JoinError) -> Self {
        ScrawlError::Internal(format!("blocking task failed: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ScrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_remote_unavailable_triggers_fallback() {
        assert!(ScrawlError::RemoteUnavailable("status failed".into()).is_remote_failure());

        let others = [
            ScrawlError::Decode("bad png".into()),
            ScrawlError::LocalRecognition("no text".into()),
            ScrawlError::UnsupportedFormat("xyz".into()),
            ScrawlError::GenericExtraction("corrupt".into()),
            ScrawlError::InvalidArgument("empty".into()),
            ScrawlError::Internal("panic".into()),
        ];
        for err in others {
            assert!(!err.is_remote_failure(), "{err} must not trigger fallback");
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: ScrawlError = io.into();
        assert!(matches!(err, ScrawlError::Io(_)));
        assert!(err.to_string().contains("missing.png"));
    }

    #[test]
    fn test_display_messages() {
        let err = ScrawlError::UnsupportedFormat(".xyz".to_string());
        assert_eq!(err.to_string(), "Unsupported format: .xyz");
    }
}
