//! HTTP client for the graph generation service.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use neurograph_core::{
    ByteStream, CoreError, CoreResult, FilterGraphRequest, GenerateRequest, GenerationService, GraphData,
};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{build_client, error_response, map_http_error};

/// Streaming generation endpoint
pub const GENERATE_PATH: &str = "/api/generate-graph";

/// Non-streaming re-filter endpoint
pub const FILTER_PATH: &str = "/api/filter-graph";

/// Talks to the generation service over HTTP
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    config: ClientConfig,
    client: Client,
}

impl HttpGenerationClient {
    /// Creates a new client with the provided configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    /// Creates a new client sharing an existing `reqwest::Client`
    pub fn with_client(config: ClientConfig, client: Client) -> Self {
        Self { config, client }
    }

    async fn error_for(response: reqwest::Response) -> CoreError {
        let error = error_response(response).await;
        warn!(status = %error.status, detail = ?error.detail, "Generation service returned an error");
        match error.detail {
            Some(detail) => CoreError::ApplicationError(detail),
            None => CoreError::TransportError(error.message()),
        }
    }
}

#[async_trait]
impl GenerationService for HttpGenerationClient {
    #[instrument(skip(self, request), fields(chars = request.text.len()))]
    async fn generate(&self, request: GenerateRequest) -> CoreResult<ByteStream> {
        let url = self.config.endpoint(GENERATE_PATH);
        debug!("Posting generation request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body = response.bytes_stream().map_err(map_http_error).boxed();
        Ok(body)
    }

    #[instrument(skip(self, request), fields(nodes = request.selected_nodes.len(), edges = request.selected_edges.len()))]
    async fn filter_graph(&self, request: FilterGraphRequest) -> CoreResult<GraphData> {
        let url = self.config.endpoint(FILTER_PATH);
        debug!("Posting filter request to {}", url);

        let response = self
            .client
            .post(&url)
            .timeout(self.config.request_timeout())
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        response
            .json::<GraphData>()
            .await
            .map_err(|e| CoreError::SerializationError(format!("Failed to parse filtered graph: {}", e)))
    }
}
