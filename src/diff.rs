//! Snapshot diffing.
//!
//! Classifies the freshly assembled item list against the last published
//! snapshot so that only actual changes reach the upload queue. With no
//! baseline (first run, or a corrupt snapshot file) everything is New — a
//! full republish. When the new content serializes identically to the
//! baseline the whole diff short-circuits to a no-op: previous snapshot
//! kept, no version bump, empty queue delta. Re-running the pipeline on
//! unchanged photo data is therefore free.

use crate::types::{GalleryItem, GallerySiteIndex};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Outcome of diffing one run's items against the baseline.
#[derive(Debug)]
pub struct DiffResult {
    /// The snapshot to publish. On a no-op this is the baseline, untouched.
    pub snapshot: GallerySiteIndex,
    pub new_items: Vec<GalleryItem>,
    pub updated_items: Vec<GalleryItem>,
    /// Paths present in the baseline (items or prior deletions) but absent
    /// from the new item set.
    pub deleted: Vec<String>,
    pub unchanged: usize,
    /// True when the new content serialized identically to the baseline and
    /// nothing needs publishing.
    pub no_op: bool,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.no_op
            || (self.new_items.is_empty()
                && self.updated_items.is_empty()
                && self.deleted.is_empty())
    }
}

/// Diff `items` against `previous`. `force` bypasses the identical-content
/// short-circuit and republishes everything as if no baseline existed.
pub fn diff(
    previous: Option<&GallerySiteIndex>,
    items: Vec<GalleryItem>,
    force: bool,
) -> Result<DiffResult, serde_json::Error> {
    let baseline = if force { None } else { previous };

    let deleted: Vec<String> = match baseline {
        Some(prev) => {
            let new_paths: BTreeSet<&str> = items.iter().map(|i| i.path.as_str()).collect();
            prev.items
                .iter()
                .map(|i| i.path.as_str())
                .chain(prev.deleted_items.iter().map(String::as_str))
                .filter(|path| !new_paths.contains(path))
                .map(String::from)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
        None => Vec::new(),
    };

    if let Some(prev) = baseline {
        if same_content(prev, &items, &deleted)? {
            debug!("snapshot content unchanged, diff is a no-op");
            return Ok(DiffResult {
                snapshot: prev.clone(),
                new_items: Vec::new(),
                updated_items: Vec::new(),
                deleted: Vec::new(),
                unchanged: items.len(),
                no_op: true,
            });
        }
    }

    let previous_by_path: HashMap<&str, &GalleryItem> = baseline
        .map(|prev| {
            prev.items
                .iter()
                .map(|item| (item.path.as_str(), item))
                .collect()
        })
        .unwrap_or_default();

    let mut new_items = Vec::new();
    let mut updated_items = Vec::new();
    let mut unchanged = 0;
    for item in &items {
        match previous_by_path.get(item.path.as_str()) {
            None => new_items.push(item.clone()),
            Some(prior) if *prior == item => unchanged += 1,
            Some(_) => updated_items.push(item.clone()),
        }
    }

    let version = previous.map(|p| p.version + 1).unwrap_or(1);
    info!(
        version,
        new = new_items.len(),
        updated = updated_items.len(),
        deleted = deleted.len(),
        unchanged,
        "snapshot diff computed"
    );

    Ok(DiffResult {
        snapshot: GallerySiteIndex {
            version,
            items,
            deleted_items: deleted.clone(),
        },
        new_items,
        updated_items,
        deleted,
        unchanged,
        no_op: false,
    })
}

/// Whether the candidate content serializes identically to the baseline,
/// version aside.
fn same_content(
    prev: &GallerySiteIndex,
    items: &[GalleryItem],
    deleted: &[String],
) -> Result<bool, serde_json::Error> {
    let prev_body = serde_json::to_string(&(&prev.items, &prev.deleted_items))?;
    let next_body = serde_json::to_string(&(items, deleted))?;
    Ok(prev_body == next_body)
}
