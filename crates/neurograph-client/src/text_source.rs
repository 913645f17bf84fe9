//! HTTP text source: search query resolution and file text extraction.

use async_trait::async_trait;
use neurograph_core::{ExtractedText, SourceError, TextSource, UploadedFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{build_client, error_response};

/// Search endpoint
pub const SEARCH_PATH: &str = "/api/wikipedia-search";

/// File upload endpoint
pub const UPLOAD_PATH: &str = "/api/upload-file";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    text: String,
    #[serde(default)]
    filename: Option<String>,
}

/// Resolves queries and uploaded files through the service's helper endpoints
#[derive(Debug, Clone)]
pub struct HttpTextSource {
    config: ClientConfig,
    client: Client,
}

impl HttpTextSource {
    /// Creates a new text source with the provided configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    /// Creates a new text source sharing an existing `reqwest::Client`
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn provider_error(error: reqwest::Error) -> SourceError {
        SourceError::Provider(error.to_string())
    }
}

#[async_trait]
impl TextSource for HttpTextSource {
    #[instrument(skip(self))]
    async fn resolve_query(&self, query: &str) -> Result<String, SourceError> {
        let url = self.config.endpoint(SEARCH_PATH);
        debug!("Resolving query through {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.config.request_timeout())
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(Self::provider_error)?;

        if !response.status().is_success() {
            let error = error_response(response).await;
            return Err(match error.status {
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                    SourceError::NotFound(error.detail.unwrap_or_else(|| query.to_string()))
                }
                _ => SourceError::Provider(error.message()),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Provider(format!("Failed to parse search response: {}", e)))?;
        Ok(body.text)
    }

    #[instrument(skip(self, file), fields(filename = %file.filename, bytes = file.content.len()))]
    async fn extract_file(&self, file: &UploadedFile) -> Result<ExtractedText, SourceError> {
        let url = self.config.endpoint(UPLOAD_PATH);
        debug!("Uploading file to {}", url);

        let part = Part::bytes(file.content.clone()).file_name(file.filename.clone());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .timeout(self.config.request_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(Self::provider_error)?;

        if !response.status().is_success() {
            let error = error_response(response).await;
            return Err(match error.status {
                StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE | StatusCode::UNPROCESSABLE_ENTITY => {
                    SourceError::Unsupported(error.detail.unwrap_or_else(|| file.filename.clone()))
                }
                _ => SourceError::Provider(error.message()),
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Provider(format!("Failed to parse upload response: {}", e)))?;
        Ok(ExtractedText {
            text: body.text,
            filename: body.filename.unwrap_or_else(|| file.filename.clone()),
        })
    }
}
