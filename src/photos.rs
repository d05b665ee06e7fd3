//! Photo document loading.
//!
//! The sync run consumes an exported photo document: a JSON array of photo
//! records, each carrying the metadata pairs and rendition descriptors the
//! export pipeline produced. This module only parses; interpretation of the
//! metadata lives on [`Photo`](crate::types::Photo).

use crate::types::Photo;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Load the photo document at `path`.
///
/// The document is a JSON array of photo records. A malformed document is an
/// error; there is no partial recovery at this level — per-record anomalies
/// (missing paths and the like) are handled later during ingestion.
pub fn load_photos(path: &Path) -> Result<Vec<Photo>, PhotoError> {
    let content = fs::read_to_string(path).map_err(|source| PhotoError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let photos: Vec<Photo> = serde_json::from_str(&content).map_err(|source| PhotoError::Json {
        path: path.display().to_string(),
        source,
    })?;
    info!(count = photos.len(), path = %path.display(), "loaded photo document");
    Ok(photos)
}
