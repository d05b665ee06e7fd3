//! The gallery tree: the path→entry map that is the single source of truth
//! for hierarchy.
//!
//! The tree is built in two phases that never interleave: a write phase where
//! photo ingestion and virtual-entry synthesis insert entries (possibly from
//! many rayon workers at once), then a read phase where navigation, assembly,
//! and diffing walk a cloned view. All mutation serializes through one mutex
//! held only across the insert itself, never across I/O.
//!
//! ## Structural invariants
//!
//! - Before an entry is inserted at path `P`, every proper prefix of `P` up
//!   to the root must already exist.
//! - Paths are globally unique. A second insert at an existing path is a
//!   [`TreeError::DuplicatePath`] — rejected and logged by callers, never
//!   fatal, because near-duplicate upstream data occasionally collides with
//!   synthesized structure.

use crate::geo::{self, Location};
use crate::paths;
use crate::types::{ImageSize, MetadataPair};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Structural anomalies raised by tree mutation. Callers log and skip the
/// offending insert rather than aborting the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("parent {parent} does not exist for entry {path}")]
    MissingParent { parent: String, path: String },
    #[error("duplicate path: {0}")]
    DuplicatePath(String),
}

/// A node in the gallery tree, keyed by its canonical "/"-terminated path.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub path: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
    pub rating: Option<f32>,
    pub metadata: Vec<MetadataPair>,
    pub keywords: Vec<String>,
    pub image_sizes: Vec<ImageSize>,
    /// Child paths, ordered ascending. The entries live in the tree map.
    pub children: Vec<String>,
    /// Set only on virtual entries, pointing back to the real album item.
    pub original_album_path: Option<String>,
    /// Hidden entries are skipped by sibling navigation and child listings.
    pub hidden: bool,
}

impl GalleryEntry {
    /// A bare folder entry. The path is canonicalized.
    pub fn folder(path: &str, title: impl Into<String>) -> Self {
        Self {
            path: paths::canonical_url(path),
            title: title.into(),
            description: None,
            location: None,
            date_created: None,
            date_updated: None,
            rating: None,
            metadata: Vec::new(),
            keywords: Vec::new(),
            image_sizes: Vec::new(),
            children: Vec::new(),
            original_album_path: None,
            hidden: false,
        }
    }

    pub fn is_folder(&self) -> bool {
        !self.children.is_empty()
    }

    /// A virtual copy of this entry at a new path: metadata, location,
    /// rating, and sizes are value copies; children are not carried; the
    /// back-reference points at this entry's real path.
    pub fn virtual_copy(&self, path: &str) -> GalleryEntry {
        GalleryEntry {
            path: paths::canonical_url(path),
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location,
            date_created: self.date_created,
            date_updated: self.date_updated,
            rating: self.rating,
            metadata: self.metadata.clone(),
            keywords: self.keywords.clone(),
            image_sizes: self.image_sizes.clone(),
            children: Vec::new(),
            original_album_path: Some(self.path.clone()),
            hidden: self.hidden,
        }
    }
}

/// The shared, mutex-guarded path→entry map.
#[derive(Debug)]
pub struct GalleryTree {
    entries: Mutex<BTreeMap<String, GalleryEntry>>,
}

impl Default for GalleryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryTree {
    pub const ROOT: &'static str = "/";

    /// A tree containing only the root folder.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            Self::ROOT.to_string(),
            GalleryEntry::folder(Self::ROOT, "Gallery"),
        );
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Insert `entry` under `parent_path`.
    ///
    /// Fails with [`TreeError::MissingParent`] if the parent is absent and
    /// [`TreeError::DuplicatePath`] if the entry's path is already taken; in
    /// both cases the tree is left untouched.
    pub fn insert(&self, parent_path: &str, entry: GalleryEntry) -> Result<(), TreeError> {
        let parent_path = paths::canonical_url(parent_path);
        let path = paths::canonical_url(&entry.path);

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&path) {
            return Err(TreeError::DuplicatePath(path));
        }
        let parent = entries
            .get_mut(&parent_path)
            .ok_or_else(|| TreeError::MissingParent {
                parent: parent_path.clone(),
                path: path.clone(),
            })?;

        if let Err(pos) = parent.children.binary_search(&path) {
            parent.children.insert(pos, path.clone());
        }
        entries.insert(path, entry);
        Ok(())
    }

    /// Synthesize every missing ancestor folder of `path`, bottom-up from
    /// the deepest existing one. Each synthesized folder's title is derived
    /// from its path fragment via [`paths::fragment_title`].
    ///
    /// Note: ensures the ancestors of `path`, not `path` itself.
    pub fn ensure_parent_folders(&self, path: &str) -> Result<(), TreeError> {
        let path = paths::canonical_url(path);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let mut parent = Self::ROOT.to_string();
        for ancestor in paths::ancestors(&path).into_iter().skip(1) {
            if !entries.contains_key(&ancestor) {
                let title = paths::leaf_fragment(&ancestor)
                    .map(paths::fragment_title)
                    .unwrap_or_default();
                let folder = GalleryEntry::folder(&ancestor, title);
                // Parent is guaranteed present: ancestors are visited
                // top-down and the root always exists.
                if let Some(entry) = entries.get_mut(&parent) {
                    if let Err(pos) = entry.children.binary_search(&ancestor) {
                        entry.children.insert(pos, ancestor.clone());
                    }
                }
                entries.insert(ancestor.clone(), folder);
            }
            parent = ancestor;
        }
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = paths::canonical_url(path);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&path)
    }

    pub fn get(&self, path: &str) -> Option<GalleryEntry> {
        let path = paths::canonical_url(path);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&path)
            .cloned()
    }

    /// Mutate an existing entry in place under the lock. Returns whether the
    /// entry was present.
    pub fn update<F>(&self, path: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut GalleryEntry),
    {
        let path = paths::canonical_url(path);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get_mut(&path) {
            Some(entry) => {
                mutate(entry);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the whole map for the read phase. Called once, after all
    /// writers have joined; readers then proceed without locking.
    pub fn snapshot(&self) -> BTreeMap<String, GalleryEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Fill in locations for folders that lack explicit coordinates, using
    /// the spherical centroid of their direct children. Post-order, so a
    /// folder of folders aggregates its children's derived centroids.
    pub fn backfill_locations(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        // Deepest paths first; children are always longer than their parent.
        let mut paths: Vec<String> = entries.keys().cloned().collect();
        paths.sort_by_key(|p| std::cmp::Reverse(p.len()));

        for path in paths {
            let Some(entry) = entries.get(&path) else {
                continue;
            };
            if entry.location.is_some() || entry.children.is_empty() {
                continue;
            }
            let points: Vec<Location> = entry
                .children
                .iter()
                .filter_map(|child| entries.get(child).and_then(|c| c.location))
                .collect();
            if let Some(center) = geo::centroid(&points) {
                if let Some(entry) = entries.get_mut(&path) {
                    entry.location = Some(center);
                }
            }
        }
    }
}
