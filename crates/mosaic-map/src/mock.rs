//! Recording mock map backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use mosaic_core::{EmbeddingRecord, Error, MapBackend, Result};

/// Outcome to produce for one create or extend call.
#[derive(Debug, Clone)]
pub enum MapMockOutcome {
    Succeed,
    /// Fail with a retryable service error.
    Transient,
    /// Fail with a non-retryable service error.
    Permanent,
}

/// Recording mock [`MapBackend`].
///
/// Create calls return `map-mock-1`, `map-mock-2`, ... in sequence; every
/// call records its record ids so tests can assert what was published.
pub struct MockMapBackend {
    script: Mutex<VecDeque<MapMockOutcome>>,
    creates: Mutex<Vec<(String, Vec<String>)>>,
    extends: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockMapBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            creates: Mutex::new(Vec::new()),
            extends: Mutex::new(Vec::new()),
        }
    }

    /// Queue an outcome for the next call; unscripted calls succeed.
    pub fn push_outcome(&self, outcome: MapMockOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Every create call: (map name, record ids).
    pub fn creates(&self) -> Vec<(String, Vec<String>)> {
        self.creates.lock().unwrap().clone()
    }

    /// Every extend call: (map id, record ids).
    pub fn extends(&self) -> Vec<(String, Vec<String>)> {
        self.extends.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    pub fn extend_count(&self) -> usize {
        self.extends.lock().unwrap().len()
    }

    fn next_outcome(&self) -> MapMockOutcome {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MapMockOutcome::Succeed)
    }
}

impl Default for MockMapBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn record_ids(records: &[EmbeddingRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}

#[async_trait]
impl MapBackend for MockMapBackend {
    async fn create_map(
        &self,
        name: &str,
        _description: &str,
        records: &[EmbeddingRecord],
    ) -> Result<String> {
        let outcome = self.next_outcome();
        let mut creates = self.creates.lock().unwrap();
        creates.push((name.to_string(), record_ids(records)));
        let id = format!("map-mock-{}", creates.len());
        drop(creates);

        match outcome {
            MapMockOutcome::Succeed => Ok(id),
            MapMockOutcome::Transient => Err(Error::transport("map", "scripted transient failure")),
            MapMockOutcome::Permanent => {
                Err(Error::from_status("map", 400, "scripted permanent failure"))
            }
        }
    }

    async fn extend_map(&self, map_id: &str, records: &[EmbeddingRecord]) -> Result<()> {
        let outcome = self.next_outcome();
        self.extends
            .lock()
            .unwrap()
            .push((map_id.to_string(), record_ids(records)));

        match outcome {
            MapMockOutcome::Succeed => Ok(()),
            MapMockOutcome::Transient => Err(Error::transport("map", "scripted transient failure")),
            MapMockOutcome::Permanent => {
                Err(Error::from_status("map", 400, "scripted permanent failure"))
            }
        }
    }

    fn map_url(&self, map_id: &str) -> String {
        format!("mock://map/{}", map_id)
    }
}
