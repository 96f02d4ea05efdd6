//! The processor loop: scan, seal, embed, persist.

use std::sync::Arc;

use tracing::info;

use mosaic_core::{EmbeddingBackend, Result, RetryPolicy};
use mosaic_store::{Ledger, RawScanner};

use crate::accumulator::BatchAccumulator;
use crate::config::ProcessorConfig;
use crate::writer::EmbeddingWriter;

/// Run the accumulator + writer loop until stopped (or once, in run-once
/// mode).
///
/// Each iteration: scan the raw tree, seal every full batch, then check
/// the flush timer. The loop is stoppable between iterations; batches and
/// ledger marks are only ever produced whole.
pub async fn run_processor(
    config: ProcessorConfig,
    backend: Arc<dyn EmbeddingBackend>,
) -> Result<()> {
    let mut dedup = Ledger::open(config.dedup_ledger_path()).await?;
    let scanner = RawScanner::new(&config.raw_dir, &config.extensions);
    let mut accumulator =
        BatchAccumulator::new(scanner, config.batch_size, config.flush_interval);
    let writer = EmbeddingWriter::new(
        backend.clone(),
        config.results_dir.clone(),
        RetryPolicy::default(),
    );

    info!(
        subsystem = "processor",
        raw_dir = %config.raw_dir.display(),
        results_dir = %config.results_dir.display(),
        batch_size = config.batch_size,
        model = backend.model_name(),
        already_embedded = dedup.len(),
        "Processor started"
    );

    loop {
        accumulator.scan_once(&dedup).await;

        while let Some(batch) = accumulator.seal_full() {
            writer.process_batch(&batch, &mut dedup).await?;
        }
        if let Some(batch) = accumulator.seal_on_flush() {
            writer.process_batch(&batch, &mut dedup).await?;
        }

        if config.run_once {
            while let Some(batch) = accumulator.seal_remaining() {
                writer.process_batch(&batch, &mut dedup).await?;
            }
            info!(subsystem = "processor", "Run-once complete");
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(config.scan_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!(subsystem = "processor", "Shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}
