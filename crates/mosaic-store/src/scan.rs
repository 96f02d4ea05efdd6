//! Raw-image tree scanning.
//!
//! Observation is a recursive directory scan rather than OS event
//! callbacks: the scan plus the atomic-rename discipline on the producing
//! side gives the same new-file visibility with none of the platform
//! variance, and the poll interval doubles as the flush-timer granularity.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Utc;
use tracing::warn;

use mosaic_core::{RecordMetadata, Result, SourceImage};

/// Extension-filtered recursive scanner over the raw-image tree.
pub struct RawScanner {
    root: PathBuf,
    extensions: Vec<String>,
}

impl RawScanner {
    /// Create a scanner for `root` accepting the given extensions
    /// (matched case-insensitively, without the leading dot).
    pub fn new(root: impl Into<PathBuf>, extensions: &[impl AsRef<str>]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the tree and return every matching image, sorted by path.
    ///
    /// A missing or unreadable root yields an empty scan with a warning —
    /// the collector may simply not have created it yet. Unreadable
    /// subdirectories and malformed (non-UTF-8) names are skipped with a
    /// warning; neither kills the scan.
    pub async fn scan(&self) -> Result<Vec<SourceImage>> {
        let mut images = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        component = "scan",
                        dir = %dir.display(),
                        error = %e,
                        "Skipping unreadable directory"
                    );
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(
                            component = "scan",
                            dir = %dir.display(),
                            error = %e,
                            "Directory listing failed mid-scan"
                        );
                        break;
                    }
                };

                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(ft) => ft,
                    Err(e) => {
                        warn!(component = "scan", path = %path.display(), error = %e,
                            "Cannot stat entry, skipping");
                        continue;
                    }
                };

                if file_type.is_dir() {
                    stack.push(path);
                    continue;
                }
                if !self.matches_extension(&path) {
                    continue;
                }

                let Some(id) = SourceImage::derive_id(&self.root, &path) else {
                    warn!(component = "scan", path = %path.display(),
                        "Malformed file name, skipping");
                    continue;
                };

                let size_bytes = match entry.metadata().await {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        warn!(component = "scan", path = %path.display(), error = %e,
                            "Cannot read metadata, skipping");
                        continue;
                    }
                };

                let participant = SourceImage::derive_participant(&self.root, &path);
                images.push(SourceImage {
                    id,
                    path,
                    observed_at: Utc::now(),
                    size_bytes,
                    participant,
                });
            }
        }

        images.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(images)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| self.extensions.iter().any(|allowed| *allowed == e))
    }
}

/// Capture the per-file metadata carried on an embedding record.
pub async fn capture_metadata(path: &Path) -> Result<RecordMetadata> {
    let meta = tokio::fs::metadata(path).await?;

    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    // Creation time is not available on every filesystem; fall back to
    // the modification time.
    let created = meta
        .created()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(modified);

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    Ok(RecordMetadata {
        filename,
        filepath: path.to_string_lossy().into_owned(),
        extension,
        size_bytes: meta.len(),
        created,
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_scan_filters_extensions_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.jpg"), b"x");
        touch(&dir.path().join("b.PNG"), b"x");
        touch(&dir.path().join("notes.txt"), b"x");
        touch(&dir.path().join("c.jpeg.partial"), b"x");

        let scanner = RawScanner::new(dir.path(), &["jpg", "png"]);
        let images = scanner.scan().await.unwrap();
        let ids: Vec<_> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_scan_recurses_and_tags_participants() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("p01/img_0001.jpg"), b"x");
        touch(&dir.path().join("p02/nested/img_0002.jpg"), b"x");
        touch(&dir.path().join("loose.jpg"), b"x");

        let scanner = RawScanner::new(dir.path(), &["jpg"]);
        let images = scanner.scan().await.unwrap();

        assert_eq!(images.len(), 3);
        let by_id = |id: &str| images.iter().find(|i| i.id == id).unwrap();
        assert_eq!(by_id("p01/img_0001").participant.as_deref(), Some("p01"));
        assert_eq!(
            by_id("p02/nested/img_0002").participant.as_deref(),
            Some("p02")
        );
        assert_eq!(by_id("loose").participant, None);
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = RawScanner::new(dir.path().join("not_yet"), &["jpg"]);
        let images = scanner.scan().await.unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn test_scan_accepts_dotted_extension_config() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.gif"), b"x");

        let scanner = RawScanner::new(dir.path(), &[".gif"]);
        assert_eq!(scanner.scan().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_metadata_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.JPG");
        touch(&path, b"hello");

        let meta = capture_metadata(&path).await.unwrap();
        assert_eq!(meta.filename, "shot.JPG");
        assert_eq!(meta.extension, ".jpg");
        assert_eq!(meta.size_bytes, 5);
        assert!(meta.modified > 0);
        assert!(meta.created > 0);
    }
}
