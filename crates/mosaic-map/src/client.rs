//! HTTP client for the remote map service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use mosaic_core::{defaults, EmbeddingRecord, Error, MapBackend, Result};

const SERVICE: &str = "map";

/// Client for the remote map service.
pub struct MapClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl MapClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::MAP_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        info!(subsystem = "map", url = %base_url, "Initializing map client");

        Self {
            client,
            base_url,
            api_key: None,
            timeout_secs: defaults::MAP_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MOSAIC_MAP_URL` | `http://127.0.0.1:8200` |
    /// | `MOSAIC_MAP_API_KEY` | unset |
    /// | `MOSAIC_MAP_TIMEOUT_SECS` | `120` |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MOSAIC_MAP_URL").unwrap_or_else(|_| defaults::MAP_URL.to_string());
        let mut client = Self::new(base_url);
        client.api_key = std::env::var("MOSAIC_MAP_API_KEY").ok().filter(|k| !k.is_empty());
        if let Some(timeout) = std::env::var("MOSAIC_MAP_TIMEOUT_SECS")
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

    /// Set the per-request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    async fn post_json<T: Serialize>(&self, url: String, body: &T) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .header("X-Request-Id", Uuid::now_v7().to_string())
            .json(body);
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
        Ok(response)
    }
}

/// Display row sent alongside each embedding: everything the map renders
/// in hover cards and filters.
#[derive(Serialize)]
struct MapItem<'a> {
    id: &'a str,
    filename: &'a str,
    filepath: &'a str,
    extension: &'a str,
    size_bytes: u64,
    created: i64,
}

impl<'a> From<&'a EmbeddingRecord> for MapItem<'a> {
    fn from(record: &'a EmbeddingRecord) -> Self {
        Self {
            id: &record.id,
            filename: &record.metadata.filename,
            filepath: &record.metadata.filepath,
            extension: &record.metadata.extension,
            size_bytes: record.metadata.size_bytes,
            created: record.metadata.created,
        }
    }
}

fn split_records(records: &[EmbeddingRecord]) -> (Vec<&[f32]>, Vec<MapItem<'_>>) {
    let embeddings = records.iter().map(|r| r.embedding.as_slice()).collect();
    let data = records.iter().map(MapItem::from).collect();
    (embeddings, data)
}

#[derive(Serialize)]
struct CreateMapRequest<'a> {
    name: &'a str,
    description: &'a str,
    embeddings: Vec<&'a [f32]>,
    data: Vec<MapItem<'a>>,
}

#[derive(Deserialize)]
struct CreateMapResponse {
    id: String,
}

#[derive(Serialize)]
struct ExtendMapRequest<'a> {
    embeddings: Vec<&'a [f32]>,
    data: Vec<MapItem<'a>>,
    /// Always `false`: the map grows incrementally, a rebuild would
    /// re-project every existing point.
    rebuild: bool,
}

#[async_trait]
impl MapBackend for MapClient {
    #[instrument(skip(self, records), fields(subsystem = "map", component = "client", op = "create_map", input_count = records.len()))]
    async fn create_map(
        &self,
        name: &str,
        description: &str,
        records: &[EmbeddingRecord],
    ) -> Result<String> {
        let (embeddings, data) = split_records(records);
        let request = CreateMapRequest {
            name,
            description,
            embeddings,
            data,
        };

        let response = self
            .post_json(format!("{}/v1/maps", self.base_url), &request)
            .await?;
        let result: CreateMapResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid response body: {}", e)))?;

        info!(
            map_id = %result.id,
            result_count = records.len(),
            "Created remote map"
        );
        Ok(result.id)
    }

    #[instrument(skip(self, records), fields(subsystem = "map", component = "client", op = "extend_map", map_id = %map_id, input_count = records.len()))]
    async fn extend_map(&self, map_id: &str, records: &[EmbeddingRecord]) -> Result<()> {
        let (embeddings, data) = split_records(records);
        let request = ExtendMapRequest {
            embeddings,
            data,
            rebuild: false,
        };

        self.post_json(
            format!("{}/v1/maps/{}/records", self.base_url, map_id),
            &request,
        )
        .await?;

        info!(result_count = records.len(), "Extended remote map");
        Ok(())
    }

    fn map_url(&self, map_id: &str) -> String {
        format!("{}/map/{}", self.base_url, map_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::RecordMetadata;

    #[test]
    fn test_map_url() {
        let client = MapClient::new("https://maps.example".to_string());
        assert_eq!(
            client.map_url("map-abc"),
            "https://maps.example/map/map-abc"
        );
    }

    #[test]
    fn test_map_item_carries_display_fields() {
        let record = EmbeddingRecord {
            id: "p01/img".to_string(),
            embedding: vec![0.1],
            metadata: RecordMetadata {
                filename: "img.jpg".to_string(),
                filepath: "/raw/p01/img.jpg".to_string(),
                extension: ".jpg".to_string(),
                size_bytes: 99,
                created: 1_700_000_000,
                modified: 1_700_000_001,
            },
        };
        let item = MapItem::from(&record);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], "p01/img");
        assert_eq!(value["filename"], "img.jpg");
        assert_eq!(value["size_bytes"], 99);
        assert_eq!(value["created"], 1_700_000_000i64);
        // Modified time is not a display field.
        assert!(value.get("modified").is_none());
    }
}
