//! Scripted mock embedding backend for deterministic testing.
//!
//! Each call pops the next scripted outcome; with the script exhausted,
//! calls succeed. Successful calls return vectors whose first component
//! encodes the input position, so tests can assert ordering survived.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mosaic_core::{EmbeddingBackend, Error, ImagePayload, Result};

/// Outcome to produce for one `embed_images` call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return one vector per input.
    Succeed,
    /// Fail with a retryable service error.
    Transient,
    /// Fail with a non-retryable service error.
    Permanent,
    /// Fail with a shape mismatch reporting `actual` vectors.
    ShortResponse(usize),
}

/// Scripted mock [`EmbeddingBackend`].
pub struct MockEmbeddingBackend {
    dimension: usize,
    max_batch: usize,
    script: Mutex<VecDeque<MockOutcome>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            max_batch: 32,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    /// Queue an outcome for the next unscripted call.
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// The image ids of every call received, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_images(&self, images: &[ImagePayload]) -> Result<Vec<Vec<f32>>> {
        self.calls
            .lock()
            .unwrap()
            .push(images.iter().map(|i| i.id.clone()).collect());

        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockOutcome::Succeed);

        match outcome {
            MockOutcome::Succeed => Ok(images
                .iter()
                .enumerate()
                .map(|(idx, _)| {
                    let mut v = vec![0.0; self.dimension];
                    if let Some(first) = v.first_mut() {
                        *first = idx as f32;
                    }
                    v
                })
                .collect()),
            MockOutcome::Transient => Err(Error::transport("embed", "scripted transient failure")),
            MockOutcome::Permanent => {
                Err(Error::from_status("embed", 400, "scripted permanent failure"))
            }
            MockOutcome::ShortResponse(actual) => Err(Error::ShapeMismatch {
                expected: images.len(),
                actual,
            }),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn max_batch(&self) -> usize {
        self.max_batch
    }
}
