use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EMPTY_ANALYZE_TEXT: &str = "Please enter some text to analyze";
pub const EMPTY_SEARCH_TEXT: &str = "Please enter a search query";
pub const NETWORK_UNREACHABLE: &str =
    "Unable to reach the analysis service. Check your connection and try again.";
pub const MALFORMED_RESPONSE: &str = "Malformed response from the analysis service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Network,
    Timeout,
    Service { status: u16 },
}

/// Failure surfaced to the presentation layer. `message` is always safe to
/// show to an end user and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            default_message(kind)
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn network() -> Self {
        Self::new(ErrorKind::Network, NETWORK_UNREACHABLE)
    }

    pub fn timeout(after_secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("The analysis service did not respond within {after_secs} seconds."),
        )
    }

    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service { status }, message)
    }
}

fn default_message(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::Validation => EMPTY_ANALYZE_TEXT.to_string(),
        ErrorKind::Network => NETWORK_UNREACHABLE.to_string(),
        ErrorKind::Timeout => "The analysis service did not respond in time.".to_string(),
        ErrorKind::Service { status } => format!("Request failed: {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_service_message_falls_back_to_status() {
        let err = RequestError::service(502, "  ");
        assert_eq!(err.message, "Request failed: 502");
        assert_eq!(err.kind, ErrorKind::Service { status: 502 });
    }

    #[test]
    fn error_kind_serializes_with_tag() {
        let value = serde_json::to_value(ErrorKind::Service { status: 404 }).expect("json");
        assert_eq!(value, serde_json::json!({"kind": "service", "status": 404}));
        let value = serde_json::to_value(ErrorKind::Timeout).expect("json");
        assert_eq!(value, serde_json::json!({"kind": "timeout"}));
    }
}
