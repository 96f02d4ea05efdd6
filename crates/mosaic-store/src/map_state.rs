//! Persisted remote-map state.
//!
//! The map state file is what turns "create a map" into a once-ever
//! operation: the remote id is persisted before any further result file is
//! processed, and every startup consults the persisted state before
//! deciding between create and extend.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mosaic_core::{Error, Result};

use crate::atomic::write_atomic;

/// Remote map state persisted across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapState {
    /// Remote map identifier; `None` until the first successful create.
    pub map_id: Option<String>,
    /// Display name the map was (or will be) created with.
    pub map_name: String,
    /// Name of the most recently uploaded result file.
    pub last_uploaded: Option<String>,
    /// Unix seconds of the last state change.
    pub updated_at: i64,
}

/// Handle to the on-disk map state file.
#[derive(Debug)]
pub struct MapStateFile {
    path: PathBuf,
    state: MapState,
}

impl MapStateFile {
    /// Load the state file, or start fresh if it does not exist.
    ///
    /// With `force_new`, any existing state is archived aside (`.bak`) and
    /// a fresh state is started, so the next upload creates a new map.
    /// A present-but-unparseable state file is a fatal error: proceeding
    /// would recreate the map and violate the never-overwrite invariant.
    pub async fn open(path: impl Into<PathBuf>, map_name: &str, force_new: bool) -> Result<Self> {
        let path = path.into();

        if force_new && tokio::fs::try_exists(&path).await? {
            let backup = path.with_extension("json.bak");
            tokio::fs::rename(&path, &backup).await?;
            warn!(
                component = "map_state",
                path = %path.display(),
                backup = %backup.display(),
                "Force-new-map: archived existing map state"
            );
        }

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let state: MapState = serde_json::from_str(&contents)
                    .map_err(|e| Error::State(format!("corrupt map state file: {}", e)))?;
                info!(
                    component = "map_state",
                    map_id = state.map_id.as_deref().unwrap_or("<none>"),
                    map_name = %state.map_name,
                    "Loaded map state"
                );
                state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MapState {
                map_id: None,
                map_name: map_name.to_string(),
                last_uploaded: None,
                updated_at: Utc::now().timestamp(),
            },
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, state })
    }

    /// The persisted remote map id, if one exists.
    pub fn map_id(&self) -> Option<&str> {
        self.state.map_id.as_deref()
    }

    pub fn map_name(&self) -> &str {
        &self.state.map_name
    }

    pub fn last_uploaded(&self) -> Option<&str> {
        self.state.last_uploaded.as_deref()
    }

    /// Persist a newly created remote map id.
    ///
    /// A held id is never overwritten with a different one; attempting to
    /// is an invariant violation and fails loudly.
    pub async fn record_created(&mut self, map_id: &str) -> Result<()> {
        match self.state.map_id.as_deref() {
            Some(existing) if existing != map_id => {
                return Err(Error::State(format!(
                    "refusing to overwrite map id {} with {}",
                    existing, map_id
                )));
            }
            _ => {}
        }
        self.state.map_id = Some(map_id.to_string());
        self.state.updated_at = Utc::now().timestamp();
        self.save().await
    }

    /// Record the most recently uploaded result file.
    pub async fn record_uploaded(&mut self, result_file: &str) -> Result<()> {
        self.state.last_uploaded = Some(result_file.to_string());
        self.state.updated_at = Utc::now().timestamp();
        self.save().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.state)?;
        write_atomic(&self.path, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = MapStateFile::open(dir.path().join("map_state.json"), "Test Map", false)
            .await
            .unwrap();
        assert_eq!(state.map_id(), None);
        assert_eq!(state.map_name(), "Test Map");
    }

    #[tokio::test]
    async fn test_record_created_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");

        {
            let mut state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
            state.record_created("map-abc123").await.unwrap();
        }

        let state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
        assert_eq!(state.map_id(), Some("map-abc123"));
    }

    #[tokio::test]
    async fn test_refuses_different_id_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");

        let mut state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
        state.record_created("map-one").await.unwrap();

        let err = state.record_created("map-two").await.unwrap_err();
        assert!(matches!(err, Error::State(_)));
        assert_eq!(state.map_id(), Some("map-one"));
    }

    #[tokio::test]
    async fn test_record_created_same_id_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");

        let mut state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
        state.record_created("map-one").await.unwrap();
        state.record_created("map-one").await.unwrap();
        assert_eq!(state.map_id(), Some("map-one"));
    }

    #[tokio::test]
    async fn test_force_new_archives_old_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");

        {
            let mut state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
            state.record_created("map-old").await.unwrap();
        }

        let state = MapStateFile::open(&path, "Test Map", true).await.unwrap();
        assert_eq!(state.map_id(), None);
        assert!(path.with_extension("json.bak").exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = MapStateFile::open(&path, "Test Map", false).await.unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[tokio::test]
    async fn test_record_uploaded_tracks_last_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map_state.json");

        let mut state = MapStateFile::open(&path, "Test Map", false).await.unwrap();
        state.record_created("map-one").await.unwrap();
        state
            .record_uploaded("batch_1700000000_0001.jsonl")
            .await
            .unwrap();

        let reloaded = MapStateFile::open(&path, "Test Map", false).await.unwrap();
        assert_eq!(
            reloaded.last_uploaded(),
            Some("batch_1700000000_0001.jsonl")
        );
    }
}
