//! Environment-driven configuration for the pipeline loops.

use std::path::PathBuf;
use std::time::Duration;

use mosaic_core::defaults;

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var).unwrap_or_else(|_| default.to_string()).into()
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_flag(var: &str) -> bool {
    std::env::var(var)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Configuration for the processor loop (accumulator + writer).
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Raw-image tree written by the external collection tool.
    pub raw_dir: PathBuf,
    /// Results tree for embedding result files.
    pub results_dir: PathBuf,
    /// Directory holding ledgers and the map state file.
    pub state_dir: PathBuf,
    /// Images per sealed batch.
    pub batch_size: usize,
    /// How long a non-empty pending queue may wait before a partial
    /// batch is sealed.
    pub flush_interval: Duration,
    /// Raw-tree scan cadence.
    pub scan_interval: Duration,
    /// Accepted image extensions (without the leading dot).
    pub extensions: Vec<String>,
    /// Use the stub backend instead of the remote embedding service.
    pub dry_run: bool,
    /// Process everything pending in one pass, then exit.
    pub run_once: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            raw_dir: defaults::RAW_DIR.into(),
            results_dir: defaults::RESULTS_DIR.into(),
            state_dir: defaults::STATE_DIR.into(),
            batch_size: defaults::BATCH_SIZE,
            flush_interval: Duration::from_secs(defaults::FLUSH_INTERVAL_SECS),
            scan_interval: Duration::from_secs(defaults::SCAN_INTERVAL_SECS),
            extensions: defaults::IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            dry_run: false,
            run_once: false,
        }
    }
}

impl ProcessorConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MOSAIC_RAW_DIR` | `data/raw` | Raw-image tree |
    /// | `MOSAIC_RESULTS_DIR` | `data/embeddings` | Results tree |
    /// | `MOSAIC_STATE_DIR` | `data/state` | Ledger/state directory |
    /// | `MOSAIC_BATCH_SIZE` | `16` | Images per batch |
    /// | `MOSAIC_FLUSH_INTERVAL_SECS` | `60` | Partial-batch flush timer |
    /// | `MOSAIC_SCAN_INTERVAL_SECS` | `5` | Raw-tree scan cadence |
    /// | `MOSAIC_IMAGE_EXTENSIONS` | `jpg,jpeg,png,gif,bmp` | Allowlist, comma-separated |
    /// | `MOSAIC_DRY_RUN` | `false` | Stub embeddings, no remote calls |
    /// | `MOSAIC_RUN_ONCE` | `false` | Single pass, then exit |
    pub fn from_env() -> Self {
        let base = Self::default();
        let extensions = match std::env::var("MOSAIC_IMAGE_EXTENSIONS") {
            Ok(list) => list
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            Err(_) => base.extensions,
        };

        Self {
            raw_dir: env_path("MOSAIC_RAW_DIR", defaults::RAW_DIR),
            results_dir: env_path("MOSAIC_RESULTS_DIR", defaults::RESULTS_DIR),
            state_dir: env_path("MOSAIC_STATE_DIR", defaults::STATE_DIR),
            batch_size: env_parse("MOSAIC_BATCH_SIZE", defaults::BATCH_SIZE).max(1),
            flush_interval: Duration::from_secs(env_parse(
                "MOSAIC_FLUSH_INTERVAL_SECS",
                defaults::FLUSH_INTERVAL_SECS,
            )),
            scan_interval: Duration::from_secs(env_parse(
                "MOSAIC_SCAN_INTERVAL_SECS",
                defaults::SCAN_INTERVAL_SECS,
            )),
            extensions,
            dry_run: env_flag("MOSAIC_DRY_RUN"),
            run_once: env_flag("MOSAIC_RUN_ONCE"),
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Enable or disable run-once mode.
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    /// Path of the dedup ledger.
    pub fn dedup_ledger_path(&self) -> PathBuf {
        self.state_dir.join(defaults::DEDUP_LEDGER_FILE)
    }
}

/// Configuration for the uploader loop.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Results tree to watch.
    pub results_dir: PathBuf,
    /// Directory holding ledgers and the map state file.
    pub state_dir: PathBuf,
    /// Display name used when the map is first created.
    pub map_name: String,
    /// Description used when the map is first created.
    pub map_description: String,
    /// Ignore any persisted map id and create a fresh map.
    pub force_new_map: bool,
    /// Results-tree scan cadence.
    pub scan_interval: Duration,
    /// Drain every unuploaded result file in one pass, then exit.
    pub run_once: bool,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            results_dir: defaults::RESULTS_DIR.into(),
            state_dir: defaults::STATE_DIR.into(),
            map_name: defaults::MAP_NAME.to_string(),
            map_description: defaults::MAP_DESCRIPTION.to_string(),
            force_new_map: false,
            scan_interval: Duration::from_secs(defaults::UPLOAD_SCAN_INTERVAL_SECS),
            run_once: false,
        }
    }
}

impl UploaderConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `MOSAIC_RESULTS_DIR` | `data/embeddings` | Results tree |
    /// | `MOSAIC_STATE_DIR` | `data/state` | Ledger/state directory |
    /// | `MOSAIC_MAP_NAME` | `Exhibition Images` | Map display name |
    /// | `MOSAIC_MAP_DESCRIPTION` | `Live exhibition image map` | Map description |
    /// | `MOSAIC_FORCE_NEW_MAP` | `false` | Start a fresh map |
    /// | `MOSAIC_UPLOAD_SCAN_INTERVAL_SECS` | `10` | Results-tree scan cadence |
    /// | `MOSAIC_RUN_ONCE` | `false` | Single pass, then exit |
    pub fn from_env() -> Self {
        Self {
            results_dir: env_path("MOSAIC_RESULTS_DIR", defaults::RESULTS_DIR),
            state_dir: env_path("MOSAIC_STATE_DIR", defaults::STATE_DIR),
            map_name: std::env::var("MOSAIC_MAP_NAME")
                .unwrap_or_else(|_| defaults::MAP_NAME.to_string()),
            map_description: std::env::var("MOSAIC_MAP_DESCRIPTION")
                .unwrap_or_else(|_| defaults::MAP_DESCRIPTION.to_string()),
            force_new_map: env_flag("MOSAIC_FORCE_NEW_MAP"),
            scan_interval: Duration::from_secs(env_parse(
                "MOSAIC_UPLOAD_SCAN_INTERVAL_SECS",
                defaults::UPLOAD_SCAN_INTERVAL_SECS,
            )),
            run_once: env_flag("MOSAIC_RUN_ONCE"),
        }
    }

    /// Enable or disable run-once mode.
    pub fn with_run_once(mut self, run_once: bool) -> Self {
        self.run_once = run_once;
        self
    }

    /// Path of the upload ledger.
    pub fn upload_ledger_path(&self) -> PathBuf {
        self.state_dir.join(defaults::UPLOAD_LEDGER_FILE)
    }

    /// Path of the map state file.
    pub fn map_state_path(&self) -> PathBuf {
        self.state_dir.join(defaults::MAP_STATE_FILE)
    }
}
