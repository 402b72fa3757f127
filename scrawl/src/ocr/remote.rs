use std::time::Duration;

use async_trait::async_trait;
use image::ImageFormat;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{RemoteCredentials, RemoteOcrConfig};
use crate::error::{Result, ScrawlError};

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";
const READ_API_PATH: &str = "vision/v3.2/read";

/// Cloud OCR behind an asynchronous submit/poll protocol.
#[async_trait]
pub trait RemoteRecognizer: Send + Sync {
    /// `extension` selects the upload form: `pdf` is sent verbatim, anything
    /// else is decoded and re-encoded as an RGB JPEG.
    async fn recognize(&self, bytes: &[u8], extension: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// State of one in-flight read operation. Owned by a single `recognize` call.
#[derive(Debug)]
struct RemoteOcrJob {
    operation_id: String,
    status: JobStatus,
    poll_interval: Duration,
    attempts: u32,
}

impl RemoteOcrJob {
    fn new(operation_id: String, poll_interval: Duration) -> Self {
        Self {
            operation_id,
            status: JobStatus::NotStarted,
            poll_interval,
            attempts: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadOperationResponse {
    status: JobStatus,
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResult {
    #[serde(default)]
    read_results: Vec<ReadResult>,
}

#[derive(Debug, Deserialize)]
struct ReadResult {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    lines: Vec<ReadLine>,
}

#[derive(Debug, Deserialize)]
struct ReadLine {
    text: String,
}

/// Client for the Computer Vision Read v3.2 REST API.
#[derive(Clone)]
pub struct AzureReadClient {
    client: Client,
    credentials: RemoteCredentials,
    language: String,
    poll_interval: Duration,
    deadline: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for AzureReadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureReadClient")
            .field("credentials", &self.credentials)
            .field("language", &self.language)
            .field("poll_interval", &self.poll_interval)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl AzureReadClient {
    pub fn new(credentials: RemoteCredentials, config: &RemoteOcrConfig) -> Result<Self> {
        if credentials.endpoint().is_empty() {
            return Err(ScrawlError::InvalidArgument(
                "Remote OCR endpoint must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ScrawlError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            language: config.language.clone(),
            poll_interval: config.poll_interval(),
            deadline: config.deadline(),
            cancel: CancellationToken::new(),
        })
    }

    /// Builds a client only when credentials are configured.
    pub fn from_config(config: &RemoteOcrConfig) -> Result<Option<Self>> {
        match &config.credentials {
            Some(credentials) => Self::new(credentials.clone(), config).map(Some),
            None => Ok(None),
        }
    }

    /// Cancelling `token` aborts any poll loop in progress with
    /// `RemoteUnavailable`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.credentials.endpoint()
    }

    async fn submit(&self, payload: Vec<u8>) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/{READ_API_PATH}/analyze", self.endpoint()))
            .query(&[("language", self.language.as_str())])
            .header(SUBSCRIPTION_KEY_HEADER, self.credentials.key())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScrawlError::RemoteUnavailable(format!(
                "authentication rejected: {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrawlError::RemoteUnavailable(format!(
                "submit failed: {status} - {body}"
            )));
        }

        let location = response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ScrawlError::RemoteUnavailable(
                    "submit response has no Operation-Location header".to_string(),
                )
            })?;

        operation_id_from_location(location).ok_or_else(|| {
            ScrawlError::RemoteUnavailable(format!(
                "cannot read operation id from Operation-Location '{location}'"
            ))
        })
    }

    async fn fetch_status(&self, job: &RemoteOcrJob) -> Result<ReadOperationResponse> {
        let response = self
            .client
            .get(format!(
                "{}/{READ_API_PATH}/analyzeResults/{}",
                self.endpoint(),
                job.operation_id
            ))
            .header(SUBSCRIPTION_KEY_HEADER, self.credentials.key())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrawlError::RemoteUnavailable(format!(
                "status check for operation {} failed: {status}",
                job.operation_id
            )));
        }

        Ok(response.json().await?)
    }

    /// Polls until the first terminal status. No status call is made after
    /// a terminal status has been seen.
    async fn poll(&self, job: &mut RemoteOcrJob) -> Result<Option<AnalyzeResult>> {
        loop {
            job.attempts += 1;
            let response = self.fetch_status(job).await?;
            job.status = response.status;
            debug!(
                operation_id = %job.operation_id,
                attempts = job.attempts,
                status = ?job.status,
                "Polled remote OCR operation"
            );

            if job.status.is_terminal() {
                return Ok(response.analyze_result);
            }

            tokio::time::sleep(job.poll_interval).await;
        }
    }

    async fn run(&self, bytes: &[u8], extension: &str) -> Result<String> {
        let all_pages = extension.eq_ignore_ascii_case("pdf");
        let payload = if all_pages {
            bytes.to_vec()
        } else {
            let owned = bytes.to_vec();
            tokio::task::spawn_blocking(move || reencode_as_jpeg(&owned)).await??
        };

        let operation_id = self.submit(payload).await?;
        let mut job = RemoteOcrJob::new(operation_id, self.poll_interval);
        let analyze_result = self.poll(&mut job).await?;

        info!(
            operation_id = %job.operation_id,
            attempts = job.attempts,
            status = ?job.status,
            "Remote OCR operation finished"
        );

        assemble_text(&job, analyze_result, all_pages)
    }
}

#[async_trait]
impl RemoteRecognizer for AzureReadClient {
    async fn recognize(&self, bytes: &[u8], extension: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(ScrawlError::InvalidArgument(
                "Remote OCR input is empty".to_string(),
            ));
        }

        let exchange = async {
            tokio::select! {
                _ = self.cancel.cancelled() => Err(ScrawlError::RemoteUnavailable(
                    "remote OCR cancelled".to_string(),
                )),
                result = self.run(bytes, extension) => result,
            }
        };

        match tokio::time::timeout(self.deadline, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    deadline_secs = self.deadline.as_secs_f64(),
                    "Remote OCR deadline expired"
                );
                Err(ScrawlError::RemoteUnavailable(format!(
                    "remote OCR timed out after {:.1} seconds",
                    self.deadline.as_secs_f64()
                )))
            }
        }
    }
}

/// The operation id is the last path segment of the Operation-Location URL.
pub(crate) fn operation_id_from_location(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next().unwrap_or(location);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Normalizes any decodable image to an RGB JPEG.
pub(crate) fn reencode_as_jpeg(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ScrawlError::Decode(format!("Failed to decode image: {e}")))?;
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut output = Vec::new();
    rgb.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
        .map_err(|e| ScrawlError::Decode(format!("Failed to encode JPEG: {e}")))?;
    Ok(output)
}

/// Joins recognised lines, each followed by `\n`. Images use the first
/// analysed page; PDFs use every page in page order.
fn assemble_text(
    job: &RemoteOcrJob,
    analyze_result: Option<AnalyzeResult>,
    all_pages: bool,
) -> Result<String> {
    match job.status {
        JobStatus::Succeeded => {}
        JobStatus::Failed => {
            return Err(ScrawlError::RemoteUnavailable(format!(
                "operation {} finished with status failed",
                job.operation_id
            )))
        }
        JobStatus::NotStarted | JobStatus::Running => {
            return Err(ScrawlError::Internal(format!(
                "operation {} read before reaching a terminal status",
                job.operation_id
            )))
        }
    }

    let mut pages = analyze_result
        .ok_or_else(|| {
            ScrawlError::RemoteUnavailable(format!(
                "operation {} succeeded without an analyzeResult",
                job.operation_id
            ))
        })?
        .read_results;

    if all_pages {
        pages.sort_by_key(|p| p.page);
    } else {
        pages.truncate(1);
    }

    let mut text = String::new();
    for line in pages.iter().flat_map(|p| p.lines.iter()) {
        text.push_str(&line.text);
        text.push('\n');
    }
    Ok(text)
}
