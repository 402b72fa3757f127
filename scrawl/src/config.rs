use std::env;
use std::fmt;
use std::time::Duration;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub remote_ocr: RemoteOcrConfig,
    pub local_ocr: LocalOcrConfig,
    pub preprocessing: PreprocessConfig,
}

/// Endpoint and access key for the cloud Read service.
///
/// Built once by the caller and handed to the client; never looked up from
/// process-wide state by the client itself.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    endpoint: String,
    key: String,
}

impl RemoteCredentials {
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RemoteOcrConfig {
    /// `None` disables the remote path; handwritten images go straight to local OCR.
    pub credentials: Option<RemoteCredentials>,
    pub language: String,
    pub poll_interval_ms: u64,
    /// Upper bound on the whole submit/poll exchange.
    pub deadline_secs: u64,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl RemoteOcrConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for RemoteOcrConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            language: "en".to_string(),
            poll_interval_ms: 1000,
            deadline_secs: 120,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalOcrConfig {
    pub language: String,
    pub data_path: Option<String>,
}

impl Default for LocalOcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Largest width or height after upscaling. Larger inputs are shrunk to fit.
    pub max_dimension: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let credentials = match (non_empty_env("OCR_ENDPOINT"), non_empty_env("OCR_API_KEY")) {
            (Some(endpoint), Some(key)) => Some(RemoteCredentials::new(endpoint, key)),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of OCR_ENDPOINT / OCR_API_KEY is set; remote OCR disabled"
                );
                None
            }
            (None, None) => None,
        };

        Self {
            remote_ocr: RemoteOcrConfig {
                credentials,
                language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
                poll_interval_ms: parse_env_or("OCR_POLL_INTERVAL_MS", 1000),
                deadline_secs: parse_env_or("OCR_DEADLINE_SECS", 120),
                request_timeout_secs: parse_env_or("OCR_REQUEST_TIMEOUT", 30),
            },
            local_ocr: LocalOcrConfig {
                language: env::var("TESSERACT_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
                data_path: non_empty_env("TESSERACT_DATA_PATH"),
            },
            preprocessing: PreprocessConfig {
                max_dimension: parse_env_or("PREPROCESS_MAX_DIMENSION", 8192),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
