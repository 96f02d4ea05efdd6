//! Centralized default constants for the mosaic pipeline.
//!
//! **This module is the single source of truth** for all shared default
//! values. The binaries and crates reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// DIRECTORY LAYOUT
// =============================================================================

/// Default raw-image tree (written by the external collection tool).
pub const RAW_DIR: &str = "data/raw";

/// Default results tree for embedding result files.
pub const RESULTS_DIR: &str = "data/embeddings";

/// Default state directory for ledgers and the map state file.
pub const STATE_DIR: &str = "data/state";

/// Dedup ledger file name (source-image ids that already have a record).
pub const DEDUP_LEDGER_FILE: &str = "embedded.jsonl";

/// Upload ledger file name (result files already pushed to the map).
pub const UPLOAD_LEDGER_FILE: &str = "uploaded.jsonl";

/// Map state file name (remote map id, persisted across runs).
pub const MAP_STATE_FILE: &str = "map_state.json";

// =============================================================================
// BATCHING
// =============================================================================

/// Default batch size for the accumulator (one embedding call per batch).
pub const BATCH_SIZE: usize = 16;

/// Seconds a non-empty pending queue may wait before a partial batch is
/// sealed by the flush timer.
pub const FLUSH_INTERVAL_SECS: u64 = 60;

/// Raw-tree scan interval in seconds. The scan doubles as the flush-timer
/// check, so this bounds flush-timer granularity.
pub const SCAN_INTERVAL_SECS: u64 = 5;

/// Results-tree scan interval for the uploader, in seconds.
pub const UPLOAD_SCAN_INTERVAL_SECS: u64 = 10;

/// Image extensions accepted by the accumulator (lowercase, no dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

// =============================================================================
// EMBEDDING SERVICE
// =============================================================================

/// Default embedding service base URL.
pub const EMBED_URL: &str = "http://127.0.0.1:8100";

/// Default vision embedding model name.
pub const EMBED_MODEL: &str = "nomic-embed-vision-v1.5";

/// Default embedding vector dimension for the default model.
pub const EMBED_DIMENSION: usize = 768;

/// Maximum images accepted per embedding request.
pub const EMBED_MAX_BATCH: usize = 32;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 60;

/// Embedding calls slower than this log a slow-operation warning.
pub const SLOW_EMBED_WARN_MS: u64 = 10_000;

// =============================================================================
// MAP SERVICE
// =============================================================================

/// Default map service base URL.
pub const MAP_URL: &str = "http://127.0.0.1:8200";

/// Default display name for the remote map.
pub const MAP_NAME: &str = "Exhibition Images";

/// Default description for the remote map.
pub const MAP_DESCRIPTION: &str = "Live exhibition image map";

/// Timeout for map create/extend requests in seconds. Map builds are slow
/// on the remote side, so this is generous relative to the embed timeout.
pub const MAP_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Maximum attempts for a retryable remote call (first try included).
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff in milliseconds.
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound on a single backoff delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_are_consistent() {
        const {
            assert!(BATCH_SIZE <= EMBED_MAX_BATCH);
            assert!(SCAN_INTERVAL_SECS < FLUSH_INTERVAL_SECS);
        }
    }

    #[test]
    fn retry_delays_ordered() {
        const {
            assert!(RETRY_BASE_DELAY_MS < RETRY_MAX_DELAY_MS);
            assert!(RETRY_MAX_ATTEMPTS >= 1);
        }
    }

    #[test]
    fn extensions_are_lowercase_without_dot() {
        for ext in IMAGE_EXTENSIONS {
            assert!(!ext.starts_with('.'));
            assert_eq!(ext.to_lowercase(), *ext);
        }
    }
}
