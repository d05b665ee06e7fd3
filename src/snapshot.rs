//! Snapshot persistence: the published site index JSON document.
//!
//! The snapshot file is both publish output and diff baseline. Loading is
//! deliberately forgiving — a missing or unparseable file means "no
//! baseline", which forces a full republish rather than aborting the run.
//! Saving rotates the prior file to a dated backup before overwriting, so a
//! bad publish can always be rolled back by hand.

use crate::types::GallerySiteIndex;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load the previous snapshot. Absence or corruption is not an error: both
/// mean "no baseline" and are logged accordingly.
pub fn load(path: &Path) -> Option<GallerySiteIndex> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no previous snapshot, starting without baseline");
            return None;
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot unreadable, treating as no baseline");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot unparseable, treating as no baseline");
            None
        }
    }
}

/// Write the snapshot, rotating any existing file to a dated backup first.
pub fn save(path: &Path, snapshot: &GallerySiteIndex) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        let backup = backup_path(path, Utc::now());
        fs::rename(path, &backup)?;
        debug!(backup = %backup.display(), "rotated previous snapshot");
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    info!(path = %path.display(), version = snapshot.version, "snapshot written");
    Ok(())
}

/// `gallery-index.json` → `gallery-index-20200517-120000.json`.
fn backup_path(path: &Path, stamp: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{stem}-{}{ext}", stamp.format("%Y%m%d-%H%M%S"));
    path.with_file_name(name)
}
