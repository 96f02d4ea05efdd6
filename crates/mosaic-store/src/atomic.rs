//! Atomic file writes: temp file + fsync + rename.

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use mosaic_core::Result;

/// Write `data` to `path` atomically.
///
/// The data lands in a `.tmp` sibling first and is renamed into place only
/// after a successful sync, so readers scanning the directory never observe
/// a partially-written file.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;
    Ok(())
}
