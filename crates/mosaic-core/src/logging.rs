//! Structured logging field name constants for the mosaic pipeline.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, item skipped or retry exhausted |
//! | INFO  | Lifecycle events (startup, shutdown), batch/upload completions |
//! | DEBUG | Decision points, dedup skips, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "accumulator", "writer", "uploader", "embed", "map", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "ledger", "map_state", "scan", "client"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "seal", "embed_images", "create_map", "extend_map"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Batch identifier being processed.
pub const BATCH_ID: &str = "batch_id";

/// Source-image identifier being operated on.
pub const IMAGE_ID: &str = "image_id";

/// Result file name being written or uploaded.
pub const RESULT_FILE: &str = "result_file";

/// Remote map identifier.
pub const MAP_ID: &str = "map_id";

/// Model name used for embedding.
pub const MODEL: &str = "model";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of images sent to the embedding service.
pub const INPUT_COUNT: &str = "input_count";

/// Number of records returned or written.
pub const RESULT_COUNT: &str = "result_count";

/// Number of pending images in the accumulator queue.
pub const PENDING_COUNT: &str = "pending_count";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
