//! Result files: one durable NDJSON artifact per sealed batch.
//!
//! Files are written to a temp path and renamed into place, so the
//! uploader's directory scan only ever observes complete files. Names are
//! the batch id plus `.jsonl`, which makes creation order discoverable by
//! sorting.

use std::path::{Path, PathBuf};

use tracing::warn;

use mosaic_core::{EmbeddingRecord, Result};

use crate::atomic::write_atomic;

/// File name for a batch's result file.
pub fn result_file_name(batch_id: &str) -> String {
    format!("{}.jsonl", batch_id)
}

/// Ledger key for a result file: its file name.
pub fn result_file_key(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(String::from)
}

/// Persist `records` as the result file for `batch_id`, atomically.
pub async fn write_result_file(
    results_dir: &Path,
    batch_id: &str,
    records: &[EmbeddingRecord],
) -> Result<PathBuf> {
    let mut data = Vec::new();
    for record in records {
        serde_json::to_writer(&mut data, record)?;
        data.push(b'\n');
    }

    let path = results_dir.join(result_file_name(batch_id));
    write_atomic(&path, &data).await?;
    Ok(path)
}

/// Parse every record from a result file.
///
/// Individual malformed lines are skipped with a warning; the remaining
/// records are still returned.
pub async fn read_result_file(path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let mut records = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EmbeddingRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    component = "result_file",
                    result_file = %path.display(),
                    line = lineno + 1,
                    error = %e,
                    "Skipping malformed record line"
                );
            }
        }
    }
    Ok(records)
}

/// List every result file under `results_dir`, sorted by name (creation
/// order). Creates the directory if it does not exist yet.
pub async fn scan_result_files(results_dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(results_dir).await?;

    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(results_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_jsonl = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"));
        if is_jsonl && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
