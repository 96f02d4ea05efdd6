//! HTTP client for the remote vision-embedding service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use mosaic_core::{defaults, EmbeddingBackend, Error, ImagePayload, Result};

const SERVICE: &str = "embed";

/// Client for the vision-embedding service.
///
/// One request per sub-batch: ordered base64 payloads in, an equal-length
/// ordered vector list out. The response shape is checked against the
/// request before ids and vectors are zipped together.
pub struct EmbedClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    max_batch: usize,
    timeout_secs: u64,
}

impl EmbedClient {
    /// Create a client with default batch size and timeout.
    pub fn new(base_url: String, model: String, dimension: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::EMBED_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "embed",
            model = %model,
            url = %base_url,
            "Initializing embedding client"
        );

        Self {
            client,
            base_url,
            api_key: None,
            model,
            dimension,
            max_batch: defaults::EMBED_MAX_BATCH,
            timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MOSAIC_EMBED_URL` | `http://127.0.0.1:8100` |
    /// | `MOSAIC_EMBED_MODEL` | `nomic-embed-vision-v1.5` |
    /// | `MOSAIC_EMBED_DIMENSION` | `768` |
    /// | `MOSAIC_EMBED_API_KEY` | unset |
    /// | `MOSAIC_EMBED_MAX_BATCH` | `32` |
    /// | `MOSAIC_EMBED_TIMEOUT_SECS` | `60` |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MOSAIC_EMBED_URL").unwrap_or_else(|_| defaults::EMBED_URL.to_string());
        let model = std::env::var("MOSAIC_EMBED_MODEL")
            .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string());
        let dimension = std::env::var("MOSAIC_EMBED_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);

        let mut client = Self::new(base_url, model, dimension);
        client.api_key = std::env::var("MOSAIC_EMBED_API_KEY").ok().filter(|k| !k.is_empty());
        if let Some(max) = std::env::var("MOSAIC_EMBED_MAX_BATCH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            client.max_batch = max.max(1);
        }
        if let Some(timeout) = std::env::var("MOSAIC_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            client.timeout_secs = timeout;
        }
        client
    }

    /// Set the bearer token sent with each request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the maximum images per request.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    /// Base64-encoded image payloads, in request order.
    images: Vec<String>,
    /// Correlation id, echoed into service logs.
    request_id: String,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingBackend for EmbedClient {
    #[instrument(skip(self, images), fields(subsystem = "embed", component = "client", op = "embed_images", model = %self.model, input_count = images.len()))]
    async fn embed_images(&self, images: &[ImagePayload]) -> Result<Vec<Vec<f32>>> {
        if images.is_empty() {
            return Ok(vec![]);
        }
        if images.len() > self.max_batch {
            return Err(Error::Config(format!(
                "sub-batch of {} exceeds embed max batch {}",
                images.len(),
                self.max_batch
            )));
        }

        let start = Instant::now();
        let engine = base64::engine::general_purpose::STANDARD;
        let request = EmbedRequest {
            model: self.model.clone(),
            images: images.iter().map(|i| engine.encode(&i.data)).collect(),
            request_id: Uuid::now_v7().to_string(),
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/embed/images", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(SERVICE, status, body));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid response body: {}", e)))?;

        // Never zip a short or long response onto the request ids.
        if result.embeddings.len() != images.len() {
            return Err(Error::ShapeMismatch {
                expected: images.len(),
                actual: result.embeddings.len(),
            });
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            result_count = result.embeddings.len(),
            duration_ms = elapsed,
            "Embedding complete"
        );
        if elapsed > defaults::SLOW_EMBED_WARN_MS {
            warn!(
                duration_ms = elapsed,
                input_count = images.len(),
                slow = true,
                "Slow embedding operation"
            );
        }

        Ok(result.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }
}
