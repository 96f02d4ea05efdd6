//! Append-only done-flag ledgers.
//!
//! A ledger is one NDJSON file of `{"id": ..., "done": true, "at": ...}`
//! entries. The full id set is loaded into memory at startup; every mark
//! appends one line and syncs before returning, so a crash can under-report
//! at most the one in-flight entry (which re-runs harmlessly).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use mosaic_core::Result;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerEntry {
    id: String,
    done: bool,
    at: i64,
}

/// Durable identifier → done-flag record enabling idempotent re-runs.
pub struct Ledger {
    path: PathBuf,
    file: File,
    done: HashSet<String>,
}

impl Ledger {
    /// Open a ledger, creating it (and parent directories) if absent, and
    /// load every completed entry.
    ///
    /// Unparseable lines — a torn tail from a crash mid-append — are
    /// skipped with a warning; every complete entry is recovered.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut done = HashSet::new();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for (lineno, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<LedgerEntry>(line) {
                        Ok(entry) if entry.done => {
                            done.insert(entry.id);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                component = "ledger",
                                path = %path.display(),
                                line = lineno + 1,
                                error = %e,
                                "Skipping unparseable ledger line"
                            );
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        debug!(
            component = "ledger",
            path = %path.display(),
            entries = done.len(),
            "Ledger loaded"
        );

        Ok(Self { path, file, done })
    }

    /// Whether `id` is already recorded done.
    pub fn contains(&self, id: &str) -> bool {
        self.done.contains(id)
    }

    /// Record `id` as done, durably. Idempotent: marking an id twice
    /// appends nothing the second time.
    pub async fn mark(&mut self, id: &str) -> Result<()> {
        if self.done.contains(id) {
            return Ok(());
        }

        let entry = LedgerEntry {
            id: id.to_string(),
            done: true,
            at: Utc::now().timestamp(),
        };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        self.file.write_all(&line).await?;
        self.file.flush().await?;
        self.file.sync_data().await?;

        self.done.insert(id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::open(dir.path().join("state/ledger.jsonl"))
            .await
            .unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_mark_and_contains() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(dir.path().join("ledger.jsonl")).await.unwrap();

        assert!(!ledger.contains("a"));
        ledger.mark("a").await.unwrap();
        assert!(ledger.contains("a"));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let mut ledger = Ledger::open(&path).await.unwrap();
            ledger.mark("p01/img_0001").await.unwrap();
            ledger.mark("p02/img_0002").await.unwrap();
        }

        let ledger = Ledger::open(&path).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("p01/img_0001"));
        assert!(ledger.contains("p02/img_0002"));
    }

    #[tokio::test]
    async fn test_mark_twice_appends_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        let mut ledger = Ledger::open(&path).await.unwrap();
        ledger.mark("a").await.unwrap();
        ledger.mark("a").await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_tolerates_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.jsonl");

        {
            let mut ledger = Ledger::open(&path).await.unwrap();
            ledger.mark("a").await.unwrap();
            ledger.mark("b").await.unwrap();
        }
        // Simulate a crash mid-append: a truncated final line.
        {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            write!(f, "{{\"id\":\"c\",\"do").unwrap();
        }

        let ledger = Ledger::open(&path).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("a"));
        assert!(ledger.contains("b"));
        assert!(!ledger.contains("c"));
    }
}
