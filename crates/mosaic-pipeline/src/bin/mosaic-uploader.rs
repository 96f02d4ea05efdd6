//! mosaic-uploader — watches the results tree and incrementally extends
//! the remote map with each new result file.

use std::sync::Arc;

use anyhow::Context;

use mosaic_map::MapClient;
use mosaic_pipeline::{run_uploader, telemetry, UploaderConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _guard = telemetry::init_tracing("mosaic-uploader");

    let config = UploaderConfig::from_env();
    let backend = Arc::new(MapClient::from_env());

    run_uploader(config, backend)
        .await
        .context("uploader loop failed")?;
    Ok(())
}
