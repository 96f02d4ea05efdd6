//! Embedding writer: sealed batch in, one result file out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use mosaic_core::{
    Batch, EmbeddingBackend, EmbeddingRecord, ImagePayload, RecordMetadata, Result, RetryPolicy,
};
use mosaic_embed::ensure_image;
use mosaic_store::{capture_metadata, write_result_file, Ledger};

/// Outcome of processing one sealed batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The persisted result file, when at least one image embedded.
    pub result_file: Option<PathBuf>,
    /// How many records were written and marked embedded.
    pub embedded: usize,
    /// Identifiers that failed and remain eligible for a later run.
    pub failed: Vec<String>,
}

/// Turns sealed batches into persisted result files.
///
/// Ordering is write-then-mark: the result file is renamed into place
/// before any id is marked in the dedup ledger, so a crash between the
/// two re-embeds rather than silently losing records.
pub struct EmbeddingWriter {
    backend: Arc<dyn EmbeddingBackend>,
    results_dir: PathBuf,
    retry: RetryPolicy,
}

impl EmbeddingWriter {
    pub fn new(backend: Arc<dyn EmbeddingBackend>, results_dir: PathBuf, retry: RetryPolicy) -> Self {
        Self {
            backend,
            results_dir,
            retry,
        }
    }

    /// Process one sealed batch: embed sub-batches, persist the result
    /// file, then mark every embedded id.
    ///
    /// Failures scoped to single images or sub-batches are collected into
    /// the outcome; only local I/O failures (result file, ledger) abort
    /// with an error, since continuing could corrupt state.
    pub async fn process_batch(&self, batch: &Batch, dedup: &mut Ledger) -> Result<BatchOutcome> {
        let start = Instant::now();
        let mut records: Vec<EmbeddingRecord> = Vec::new();
        let mut failed: Vec<String> = Vec::new();

        for chunk in batch.images.chunks(self.backend.max_batch()) {
            let (payloads, metadata) = self.load_chunk(chunk, dedup, &mut failed).await;
            if payloads.is_empty() {
                continue;
            }

            let outcome = self
                .retry
                .run("embed_images", || self.backend.embed_images(&payloads))
                .await;

            match outcome {
                Ok(vectors) => {
                    for ((payload, meta), embedding) in
                        payloads.into_iter().zip(metadata).zip(vectors)
                    {
                        records.push(EmbeddingRecord {
                            id: payload.id,
                            embedding,
                            metadata: meta,
                        });
                    }
                }
                Err(e) => {
                    let ids: Vec<&str> = payloads.iter().map(|p| p.id.as_str()).collect();
                    warn!(
                        subsystem = "writer",
                        batch_id = %batch.id,
                        error = %e,
                        image_ids = ?ids,
                        "Sub-batch failed to embed; identifiers stay eligible for a later run"
                    );
                    failed.extend(ids.iter().map(|id| id.to_string()));
                }
            }
        }

        if records.is_empty() {
            info!(
                subsystem = "writer",
                batch_id = %batch.id,
                failed_count = failed.len(),
                "No records produced for batch"
            );
            return Ok(BatchOutcome {
                result_file: None,
                embedded: 0,
                failed,
            });
        }

        // Persist first; marking before the write could strand ids as
        // embedded with no record to show for it.
        let path = write_result_file(&self.results_dir, &batch.id, &records).await?;
        for record in &records {
            dedup.mark(&record.id).await?;
        }

        info!(
            subsystem = "writer",
            batch_id = %batch.id,
            result_file = %path.display(),
            result_count = records.len(),
            failed_count = failed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch embedded and persisted"
        );

        Ok(BatchOutcome {
            result_file: Some(path),
            embedded: records.len(),
            failed,
        })
    }

    /// Read, sniff, and stat each image of a sub-batch. Images that fail
    /// here are dropped from the request with a warning and reported
    /// failed; they never reach the remote service.
    async fn load_chunk(
        &self,
        chunk: &[mosaic_core::SourceImage],
        dedup: &Ledger,
        failed: &mut Vec<String>,
    ) -> (Vec<ImagePayload>, Vec<RecordMetadata>) {
        let mut payloads = Vec::with_capacity(chunk.len());
        let mut metadata = Vec::with_capacity(chunk.len());

        for image in chunk {
            if dedup.contains(&image.id) {
                debug!(
                    subsystem = "writer",
                    image_id = %image.id,
                    "Already embedded, dropping from sub-batch"
                );
                continue;
            }

            let data = match tokio::fs::read(&image.path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!(
                        subsystem = "writer",
                        image_id = %image.id,
                        error = %e,
                        "Cannot read image, skipping"
                    );
                    failed.push(image.id.clone());
                    continue;
                }
            };
            if let Err(e) = ensure_image(&image.id, &data) {
                warn!(
                    subsystem = "writer",
                    image_id = %image.id,
                    error = %e,
                    "Rejected by decodability check, skipping"
                );
                failed.push(image.id.clone());
                continue;
            }
            let meta = match capture_metadata(&image.path).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(
                        subsystem = "writer",
                        image_id = %image.id,
                        error = %e,
                        "Cannot stat image, skipping"
                    );
                    failed.push(image.id.clone());
                    continue;
                }
            };

            payloads.push(ImagePayload {
                id: image.id.clone(),
                data,
            });
            metadata.push(meta);
        }

        (payloads, metadata)
    }
}
