// src/health/probe.rs
use super::ServiceDescriptor;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::{timeout, Duration};

/// Health responses are a few hundred bytes; anything bigger is not one.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {0}")]
    HttpStatus(StatusCode),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Field '{0}' missing or not a string")]
    MissingField(String),
}

impl ProbeError {
    /// Short label used for the metrics outcome dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Request(_) => "request",
            ProbeError::Timeout(_) => "timeout",
            ProbeError::HttpStatus(_) => "http_status",
            ProbeError::MalformedBody(_) => "malformed_body",
            ProbeError::MissingField(_) => "missing_field",
        }
    }
}

/// One health probe against one service. Returns the raw value of the
/// descriptor's status field; classification happens in the aggregator.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<String, ProbeError>;

    fn name(&self) -> &'static str;
}

pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    async fn fetch(&self, descriptor: &ServiceDescriptor) -> Result<String, ProbeError> {
        let mut response = self.client.get(descriptor.probe_url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status));
        }

        if response.content_length().map_or(false, |len| len > MAX_BODY_BYTES as u64) {
            return Err(body_too_large());
        }

        // Content-Length may be absent or wrong; enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(body_too_large());
            }
            body.extend_from_slice(&chunk);
        }

        extract_status(&body, &descriptor.status_field)
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<String, ProbeError> {
        // reqwest's own timeout does not cover a body that trickles in forever
        match timeout(self.timeout, self.fetch(descriptor)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

fn body_too_large() -> ProbeError {
    ProbeError::MalformedBody(format!("body exceeds {} bytes", MAX_BODY_BYTES))
}

/// Pull `field` out of a JSON object body. Only string values count.
pub fn extract_status(body: &[u8], field: &str) -> Result<String, ProbeError> {
    if body.is_empty() {
        return Err(ProbeError::MalformedBody("empty body".to_string()));
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ProbeError::MalformedBody(e.to_string()))?;

    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ProbeError::MissingField(field.to_string()))
}
