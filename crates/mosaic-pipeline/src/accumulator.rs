//! Batch accumulator: pending queue with size- and timer-based sealing.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, info};

use mosaic_core::{Batch, SourceImage};
use mosaic_store::{Ledger, RawScanner};

/// Accumulates newly observed images into an owned pending queue and
/// seals them into batches.
///
/// Two triggers seal a batch: the queue reaching the batch size, and a
/// flush timer elapsing while the queue is non-empty. Sealing drains the
/// head of the queue atomically with respect to new insertions — images
/// observed during a seal land behind it, never inside or lost.
///
/// The queue is owned exclusively by the single processor loop; there is
/// no shared mutable state.
pub struct BatchAccumulator {
    scanner: RawScanner,
    pending: VecDeque<SourceImage>,
    /// Ids enqueued during this process's lifetime (pending or already
    /// sealed), so rescans of the same tree add nothing twice.
    seen: HashSet<String>,
    batch_size: usize,
    flush_interval: Duration,
    /// When the oldest currently-pending image was enqueued into an empty
    /// queue; `None` while the queue is empty.
    pending_since: Option<Instant>,
    /// Disambiguates batch ids across process lifetimes.
    run_tag: String,
    seq: u64,
}

impl BatchAccumulator {
    pub fn new(scanner: RawScanner, batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            scanner,
            pending: VecDeque::new(),
            seen: HashSet::new(),
            batch_size: batch_size.max(1),
            flush_interval,
            pending_since: None,
            run_tag: Batch::run_tag(),
            seq: 0,
        }
    }

    /// Scan the raw tree once and enqueue every image not yet seen and
    /// not already recorded in the dedup ledger. Returns how many images
    /// were added.
    pub async fn scan_once(&mut self, dedup: &Ledger) -> usize {
        let images = match self.scanner.scan().await {
            Ok(images) => images,
            Err(e) => {
                // Observation errors never terminate the watch loop.
                tracing::warn!(
                    subsystem = "accumulator",
                    op = "scan",
                    error = %e,
                    "Raw tree scan failed, will retry next cycle"
                );
                return 0;
            }
        };

        let mut added = 0;
        for image in images {
            if self.seen.contains(&image.id) {
                continue;
            }
            if dedup.contains(&image.id) {
                debug!(
                    subsystem = "accumulator",
                    image_id = %image.id,
                    "Already embedded, skipping"
                );
                self.seen.insert(image.id);
                continue;
            }
            self.seen.insert(image.id.clone());
            if self.pending.is_empty() {
                self.pending_since = Some(Instant::now());
            }
            self.pending.push_back(image);
            added += 1;
        }

        if added > 0 {
            info!(
                subsystem = "accumulator",
                result_count = added,
                pending_count = self.pending.len(),
                "New images queued"
            );
        }
        added
    }

    /// Seal a full batch if the pending queue has reached the batch size.
    pub fn seal_full(&mut self) -> Option<Batch> {
        if self.pending.len() >= self.batch_size {
            Some(self.seal(self.batch_size))
        } else {
            None
        }
    }

    /// Seal a partial batch if the flush timer has elapsed on a non-empty
    /// queue.
    pub fn seal_on_flush(&mut self) -> Option<Batch> {
        let due = self
            .pending_since
            .is_some_and(|since| since.elapsed() >= self.flush_interval);
        if due && !self.pending.is_empty() {
            Some(self.seal(self.pending.len().min(self.batch_size)))
        } else {
            None
        }
    }

    /// Seal whatever is pending, regardless of size or timer. Used by
    /// run-once mode to drain the queue before exit.
    pub fn seal_remaining(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.seal(self.pending.len().min(self.batch_size)))
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn seal(&mut self, count: usize) -> Batch {
        let images: Vec<SourceImage> = self.pending.drain(..count).collect();
        self.pending_since = if self.pending.is_empty() {
            None
        } else {
            Some(Instant::now())
        };

        let id = Batch::make_id(Utc::now().timestamp(), &self.run_tag, self.seq);
        self.seq += 1;

        info!(
            subsystem = "accumulator",
            op = "seal",
            batch_id = %id,
            result_count = images.len(),
            pending_count = self.pending.len(),
            "Sealed batch"
        );
        Batch::new(id, images)
    }
}
