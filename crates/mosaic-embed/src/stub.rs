//! Stub backend for dry runs.

use async_trait::async_trait;

use mosaic_core::{EmbeddingBackend, ImagePayload, Result};

/// Backend that emits zero vectors without touching the network.
///
/// Used by dry-run mode to rehearse an installation — ledgers and result
/// files behave exactly as with the real service, only the vectors are
/// placeholders.
pub struct StubEmbeddingBackend {
    dimension: usize,
    model: String,
    max_batch: usize,
}

impl StubEmbeddingBackend {
    pub fn new(dimension: usize, max_batch: usize) -> Self {
        Self {
            dimension,
            model: "stub".to_string(),
            max_batch: max_batch.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingBackend for StubEmbeddingBackend {
    async fn embed_images(&self, images: &[ImagePayload]) -> Result<Vec<Vec<f32>>> {
        Ok(images.iter().map(|_| vec![0.0; self.dimension]).collect())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_emits_zero_vectors_of_dimension() {
        let backend = StubEmbeddingBackend::new(4, 16);
        let images = vec![
            ImagePayload {
                id: "a".to_string(),
                data: vec![1],
            },
            ImagePayload {
                id: "b".to_string(),
                data: vec![2],
            },
        ];
        let vectors = backend.embed_images(&images).await.unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 4));
        assert!(vectors.iter().flatten().all(|x| *x == 0.0));
    }
}
