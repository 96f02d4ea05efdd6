//! mosaic-processor — watches the raw-image tree, embeds batches, and
//! writes one result file per sealed batch.

use std::sync::Arc;

use anyhow::Context;

use mosaic_core::{defaults, EmbeddingBackend};
use mosaic_embed::{EmbedClient, StubEmbeddingBackend};
use mosaic_pipeline::{run_processor, telemetry, ProcessorConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _guard = telemetry::init_tracing("mosaic-processor");

    let config = ProcessorConfig::from_env();

    let backend: Arc<dyn EmbeddingBackend> = if config.dry_run {
        let dimension = std::env::var("MOSAIC_EMBED_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);
        tracing::warn!(
            subsystem = "processor",
            "Dry run: embeddings are zero vectors, no remote calls"
        );
        Arc::new(StubEmbeddingBackend::new(dimension, defaults::EMBED_MAX_BATCH))
    } else {
        Arc::new(EmbedClient::from_env())
    };

    run_processor(config, backend)
        .await
        .context("processor loop failed")?;
    Ok(())
}
