use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    error::{RequestError, MALFORMED_RESPONSE},
    protocol::{ErrorBody, ServiceRequest},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("analysis service unreachable: {0}")]
    Network(String),
    #[error("analysis service returned {status}: {detail}")]
    Service { status: u16, detail: String },
    #[error("analysis service did not respond within {0:?}")]
    Timeout(Duration),
}

impl From<TransportError> for RequestError {
    fn from(value: TransportError) -> Self {
        match value {
            // The underlying cause stays in logs; users get the generic text.
            TransportError::Network(_) => RequestError::network(),
            TransportError::Service { status, detail } => RequestError::service(status, detail),
            TransportError::Timeout(after) => RequestError::timeout(after.as_secs().max(1)),
        }
    }
}

/// Successful (2xx) response body, parsed as JSON but not yet typed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn decode<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        serde_json::from_value(self.body).map_err(|_| TransportError::Service {
            status: self.status,
            detail: MALFORMED_RESPONSE.to_string(),
        })
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ServiceRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport. Does not retry.
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .context("failed to build analysis service http client")?;
        Ok(Self {
            http,
            base_url: config.base_url().clone(),
            timeout: config.request_timeout(),
        })
    }

    fn url_for(&self, request: &ServiceRequest) -> Result<Url, TransportError> {
        self.base_url
            .join(request.path())
            .map_err(|err| TransportError::Network(format!("invalid endpoint url: {err}")))
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ServiceRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(&request)?;
        debug!(endpoint = request.path(), %url, "sending analysis service request");

        let builder = match &request {
            ServiceRequest::Analyze(body) => self.http.post(url).json(body),
            ServiceRequest::Search(body) => self.http.post(url).json(body),
            ServiceRequest::Groups | ServiceRequest::Categories | ServiceRequest::Health => {
                self.http.get(url)
            }
        };

        let res = builder.send().await.map_err(|err| self.classify(err))?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(|err| self.classify(err))?;
        debug!(
            endpoint = request.path(),
            status = status.as_u16(),
            body_len = bytes.len(),
            "analysis service responded"
        );

        if !status.is_success() {
            return Err(TransportError::Service {
                status: status.as_u16(),
                detail: error_detail(status, &bytes),
            });
        }

        let body = serde_json::from_slice(&bytes).map_err(|_| TransportError::Service {
            status: status.as_u16(),
            detail: MALFORMED_RESPONSE.to_string(),
        })?;
        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Server-supplied `error` text when present, otherwise a message built from
/// the status code. Never empty.
pub fn error_detail(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .map(|error| error.trim().to_string())
        .filter(|error| !error.is_empty())
        .unwrap_or_else(|| status_message(status))
}

fn status_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("Request failed: {} {reason}", status.as_u16()),
        None => format!("Request failed: {}", status.as_u16()),
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
