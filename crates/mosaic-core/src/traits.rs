//! Backend trait seams for the remote services.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EmbeddingRecord, ImagePayload};

// =============================================================================
// EMBEDDING
// =============================================================================

/// Backend for generating image embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given images.
    ///
    /// Returns one vector per input, in input order. Implementations must
    /// never reorder and must fail with [`crate::Error::ShapeMismatch`]
    /// when the service returns a different count than requested, rather
    /// than silently misaligning ids to vectors.
    async fn embed_images(&self, images: &[ImagePayload]) -> Result<Vec<Vec<f32>>>;

    /// The expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// The model name being used.
    fn model_name(&self) -> &str;

    /// Maximum images accepted per request; callers partition larger
    /// batches into sub-batches of at most this size.
    fn max_batch(&self) -> usize;
}

// =============================================================================
// MAP
// =============================================================================

/// Backend for the remote map service.
#[async_trait]
pub trait MapBackend: Send + Sync {
    /// Create a new map seeded with `records`; returns the remote map id.
    async fn create_map(
        &self,
        name: &str,
        description: &str,
        records: &[EmbeddingRecord],
    ) -> Result<String>;

    /// Extend an existing map with `records` only — never a full rebuild.
    async fn extend_map(&self, map_id: &str, records: &[EmbeddingRecord]) -> Result<()>;

    /// Human-visible URL for a map id, for operator logs.
    fn map_url(&self, map_id: &str) -> String;
}
