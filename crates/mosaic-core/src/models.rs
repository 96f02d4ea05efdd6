//! Core data models for the mosaic pipeline.
//!
//! These types are shared across all mosaic crates and represent the
//! domain entities flowing through the pipeline: source images observed on
//! disk, sealed batches, and the embedding records persisted to result
//! files and pushed to the remote map.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// SOURCE IMAGES
// =============================================================================

/// An image observed under the raw tree. Created when first seen on disk,
/// never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Stable identifier: the path relative to the raw root with the
    /// extension removed, `/`-joined. Unique across participant folders
    /// and stable across restarts.
    pub id: String,
    /// Absolute path of the file on disk.
    pub path: PathBuf,
    /// When this process first observed the file.
    pub observed_at: DateTime<Utc>,
    /// File size at observation time.
    pub size_bytes: u64,
    /// First path component under the raw root, when the file is nested
    /// in a per-participant subdirectory.
    pub participant: Option<String>,
}

impl SourceImage {
    /// Derive the stable identifier for a file under `raw_root`.
    ///
    /// Returns `None` for paths outside the root or with non-UTF-8
    /// components (the caller skips those with a warning).
    pub fn derive_id(raw_root: &Path, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(raw_root).ok()?;
        let mut parts = Vec::new();
        for comp in rel.components() {
            parts.push(comp.as_os_str().to_str()?);
        }
        let last = parts.pop()?;
        let stem = Path::new(last).file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        parts.push(stem);
        Some(parts.join("/"))
    }

    /// Derive the participant tag: the first directory component of the
    /// path relative to `raw_root`, if any.
    pub fn derive_participant(raw_root: &Path, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(raw_root).ok()?;
        let mut comps = rel.components();
        let first = comps.next()?;
        // The first component is the participant folder only when more
        // components follow (i.e. the file is nested).
        comps.next()?;
        first.as_os_str().to_str().map(String::from)
    }
}

// =============================================================================
// BATCHES
// =============================================================================

/// An ordered, bounded group of source images sealed by the accumulator.
/// Immutable once sealed.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Identifier of the form `batch_{unix_seconds}_{run}_{seq}`;
    /// lexicographic order of ids matches creation order to second
    /// granularity, and the run tag keeps ids from colliding across
    /// restarts within the same second.
    pub id: String,
    /// Images in arrival order.
    pub images: Vec<SourceImage>,
    /// When the batch was sealed.
    pub sealed_at: DateTime<Utc>,
}

impl Batch {
    /// Seal a new batch from the given images.
    pub fn new(id: impl Into<String>, images: Vec<SourceImage>) -> Self {
        Self {
            id: id.into(),
            images,
            sealed_at: Utc::now(),
        }
    }

    /// Build the batch id for a seal at `unix_seconds` with sequence `seq`.
    ///
    /// The zero-padded sequence keeps same-second seals ordered within a
    /// process, and `run_tag` disambiguates seals from different process
    /// lifetimes landing in the same second — a sealed batch's result
    /// file is immutable and must never be overwritten by a successor.
    pub fn make_id(unix_seconds: i64, run_tag: &str, seq: u64) -> String {
        format!("batch_{}_{}_{:04}", unix_seconds, run_tag, seq)
    }

    /// Generate a fresh run tag for batch-id disambiguation.
    pub fn run_tag() -> String {
        format!("{:08x}", rand::random::<u32>())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The ids of every image in this batch, in order.
    pub fn image_ids(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.id.as_str()).collect()
    }
}

// =============================================================================
// EMBEDDING RECORDS
// =============================================================================

/// Per-file metadata carried alongside an embedding.
///
/// Field names and numeric types are part of the result-file wire format:
/// sizes and timestamps serialize as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub filename: String,
    pub filepath: String,
    /// Lowercased extension including the leading dot (".jpg").
    pub extension: String,
    pub size_bytes: u64,
    /// Creation time as Unix seconds.
    pub created: i64,
    /// Modification time as Unix seconds.
    pub modified: i64,
}

/// One embedded image: the central exactly-once artifact. No source-image
/// id ever appears in more than one record across the system's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Equals the `SourceImage` id.
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// An image loaded into memory for an embedding request, paired with its
/// id so failures can be reported per-identifier.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub id: String,
    pub data: Vec<u8>,
}
