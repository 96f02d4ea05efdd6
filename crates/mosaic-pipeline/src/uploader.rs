//! Map uploader: pushes new result files to the remote map.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use mosaic_core::{Error, MapBackend, Result, RetryPolicy};
use mosaic_store::{
    read_result_file, result_file_key, scan_result_files, Ledger, MapStateFile,
};

use crate::config::UploaderConfig;

/// Watches the results tree and publishes each new result file exactly
/// once (locally — remote delivery is at-least-once on ambiguous
/// failures).
///
/// The first file uploaded with no persisted map id creates the map; the
/// returned id is persisted before any further file is processed, so a
/// crash immediately after creation cannot lead to a second create on
/// restart.
pub struct MapUploader {
    backend: Arc<dyn MapBackend>,
    config: UploaderConfig,
    ledger: Ledger,
    state: MapStateFile,
    retry: RetryPolicy,
}

impl MapUploader {
    /// Open the upload ledger and map state and build the uploader.
    pub async fn open(backend: Arc<dyn MapBackend>, config: UploaderConfig) -> Result<Self> {
        let ledger = Ledger::open(config.upload_ledger_path()).await?;
        let state = MapStateFile::open(
            config.map_state_path(),
            &config.map_name,
            config.force_new_map,
        )
        .await?;

        info!(
            subsystem = "uploader",
            map_id = state.map_id().unwrap_or("<none>"),
            uploaded = ledger.len(),
            "Uploader state loaded"
        );

        Ok(Self {
            backend,
            config,
            ledger,
            state,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy (shorter delays in tests).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The currently persisted remote map id.
    pub fn map_id(&self) -> Option<&str> {
        self.state.map_id()
    }

    /// Scan the results tree and upload every file not yet in the upload
    /// ledger, in name (creation) order. Returns how many files were
    /// uploaded.
    ///
    /// Service failures on one file are logged and leave it unmarked for
    /// a later cycle without aborting sibling files; local I/O and state
    /// errors abort the cycle.
    pub async fn run_cycle(&mut self) -> Result<usize> {
        let files = scan_result_files(&self.config.results_dir).await?;

        let mut uploaded = 0;
        for path in files {
            let Some(key) = result_file_key(&path) else {
                warn!(
                    subsystem = "uploader",
                    path = %path.display(),
                    "Malformed result file name, skipping"
                );
                continue;
            };
            if self.ledger.contains(&key) {
                continue;
            }

            match self.upload_file(&path, &key).await {
                Ok(()) => uploaded += 1,
                Err(e @ (Error::Io(_) | Error::State(_) | Error::Config(_))) => return Err(e),
                Err(e) => {
                    warn!(
                        subsystem = "uploader",
                        result_file = %key,
                        error = %e,
                        "Upload failed; file stays unmarked for a later cycle"
                    );
                }
            }
        }
        Ok(uploaded)
    }

    async fn upload_file(&mut self, path: &Path, key: &str) -> Result<()> {
        let records = read_result_file(path).await?;
        if records.is_empty() {
            warn!(
                subsystem = "uploader",
                result_file = %key,
                "No parseable records, marking uploaded with nothing to publish"
            );
            self.ledger.mark(key).await?;
            return Ok(());
        }

        debug!(
            subsystem = "uploader",
            result_file = %key,
            result_count = records.len(),
            "Uploading result file"
        );

        match self.state.map_id().map(String::from) {
            None => {
                let name = self.state.map_name().to_string();
                let description = self.config.map_description.clone();
                let map_id = self
                    .retry
                    .run("create_map", || {
                        self.backend.create_map(&name, &description, &records)
                    })
                    .await?;
                // Persist before anything else happens; a second create
                // after a crash here would fork the exhibition onto two
                // maps.
                self.state.record_created(&map_id).await?;
                info!(
                    subsystem = "uploader",
                    map_id = %map_id,
                    url = %self.backend.map_url(&map_id),
                    "Created remote map"
                );
            }
            Some(map_id) => {
                self.retry
                    .run("extend_map", || self.backend.extend_map(&map_id, &records))
                    .await?;
            }
        }

        self.ledger.mark(key).await?;
        self.state.record_uploaded(key).await?;

        info!(
            subsystem = "uploader",
            result_file = %key,
            result_count = records.len(),
            map_id = self.state.map_id().unwrap_or("<none>"),
            "Result file uploaded"
        );
        Ok(())
    }
}

/// Run the uploader loop until stopped (or once, in run-once mode).
pub async fn run_uploader(config: UploaderConfig, backend: Arc<dyn MapBackend>) -> Result<()> {
    let run_once = config.run_once;
    let scan_interval = config.scan_interval;
    let mut uploader = MapUploader::open(backend, config).await?;

    info!(subsystem = "uploader", "Uploader started");
    loop {
        let uploaded = uploader.run_cycle().await?;
        if uploaded > 0 {
            debug!(subsystem = "uploader", result_count = uploaded, "Cycle complete");
        }
        if run_once {
            info!(subsystem = "uploader", "Run-once complete");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(scan_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!(subsystem = "uploader", "Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
