//! Helpers shared by the HTTP collaborators.

use neurograph_core::CoreError;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// FastAPI-style error body: `{"detail": ...}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Status and `detail` of an unsuccessful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorResponse {
    pub status: StatusCode,
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// The detail text, or a message naming the status
    pub fn message(&self) -> String {
        self.detail
            .clone()
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

/// Shared client with the configured connect timeout and no total timeout,
/// so streamed responses can run for as long as the service needs
pub(crate) fn build_client(config: &ClientConfig) -> ClientResult<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout())
        .build()?;
    Ok(client)
}

/// Maps a reqwest error to a transport error
pub(crate) fn map_http_error(error: reqwest::Error) -> CoreError {
    if error.is_timeout() {
        CoreError::TransportError(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        CoreError::TransportError(format!("Connection error: {}", error))
    } else {
        CoreError::TransportError(format!("HTTP error: {}", error))
    }
}

/// Consume an unsuccessful response and extract its `detail`
pub(crate) async fn error_response(response: Response) -> ErrorResponse {
    let status = response.status();
    let detail = response.text().await.ok().and_then(|body| parse_detail(&body));
    ErrorResponse { status, detail }
}

fn parse_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
