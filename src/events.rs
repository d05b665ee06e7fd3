//! Event album synthesis.
//!
//! Folders directly under the album root whose names match a registered
//! event pattern (a `YYYY-MM-DD` date prefix plus a recognizable slug) are
//! re-projected into a recurring-occasion hierarchy:
//!
//! ```text
//! /albums/2020-12-25-christmas-morning/...
//!     → /events/christmas/2020/2020-12-25-christmas-morning/...
//! ```
//!
//! Detection is heuristic pattern matching. When more than one pattern
//! matches a folder, the first registered pattern wins: built-in events in
//! declaration order, then config-supplied events in file order.

use crate::paths;
use crate::tree::GalleryTree;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum EventError {
    #[error("invalid event pattern for {name}: {source}")]
    InvalidPattern {
        name: String,
        source: regex::Error,
    },
}

/// A static rule recognizing date-prefixed album folders that correspond to
/// a known recurring occasion.
#[derive(Debug, Clone)]
pub struct EventDesc {
    /// URL-safe event name, e.g. `"christmas"`.
    pub name: String,
    pub description: String,
    pattern: Regex,
}

impl EventDesc {
    pub fn new(name: &str, pattern: &str, description: &str) -> Result<Self, EventError> {
        let pattern = Regex::new(pattern).map_err(|source| EventError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            pattern,
        })
    }

    /// Whether this rule recognizes the given album folder fragment.
    pub fn matches(&self, fragment: &str) -> bool {
        self.pattern.is_match(fragment)
    }
}

/// The ordered set of event rules consulted during synthesis.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    descs: Vec<EventDesc>,
}

impl EventRegistry {
    /// The built-in recurring occasions.
    pub fn builtin() -> Self {
        let descs = [
            (
                "christmas",
                r"^\d{4}-\d{2}-\d{2}.*christmas",
                "Christmas celebrations through the years",
            ),
            (
                "thanksgiving",
                r"^\d{4}-\d{2}-\d{2}.*thanksgiving",
                "Thanksgiving gatherings through the years",
            ),
            (
                "halloween",
                r"^\d{4}-\d{2}-\d{2}.*halloween",
                "Halloween through the years",
            ),
            (
                "easter",
                r"^\d{4}-\d{2}-\d{2}.*easter",
                "Easter through the years",
            ),
            (
                "new-years",
                r"^\d{4}-\d{2}-\d{2}.*new-year",
                "New Year celebrations through the years",
            ),
        ]
        .into_iter()
        .map(|(name, pattern, description)| {
            // Built-in patterns are compile-time constants; a failure here
            // is a programming error caught by the test below.
            EventDesc::new(name, pattern, description)
        })
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_default();
        Self { descs }
    }

    pub fn push(&mut self, desc: EventDesc) {
        self.descs.push(desc);
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    /// First registered rule matching the folder fragment, if any.
    ///
    /// First match wins: the source system left multi-match behavior
    /// undefined, so registration order is the documented tie-break.
    pub fn match_folder(&self, fragment: &str) -> Option<&EventDesc> {
        self.descs.iter().find(|desc| desc.matches(fragment))
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Synthesize the `/events/` hierarchy into the tree. Returns the number of
/// pointer entries created.
///
/// Only folders directly under `/albums/` are considered, and only those
/// with a parseable date prefix; their photo children are re-projected under
/// `/events/{name}/{year}/{folder-fragment}/`.
pub fn synthesize(tree: &GalleryTree, registry: &EventRegistry) -> usize {
    let Some(album_root) = tree.get("/albums/") else {
        return 0;
    };
    let mut created = 0;

    for folder_path in &album_root.children {
        let Some(fragment) = paths::leaf_fragment(folder_path).map(str::to_string) else {
            continue;
        };
        let Some((date, _)) = paths::date_prefix(&fragment) else {
            continue;
        };
        let Some(desc) = registry.match_folder(&fragment) else {
            continue;
        };
        let Some(folder) = tree.get(folder_path) else {
            continue;
        };

        let year = format!("{}", chrono::Datelike::year(&date));
        let occasion_path = format!("/events/{}/{}/{}/", desc.name, year, fragment);

        if let Err(err) = tree.ensure_parent_folders(&occasion_path) {
            warn!(path = %occasion_path, %err, "event folder synthesis failed");
            continue;
        }
        // The event root carries the rule's description.
        annotate_event_root(tree, &desc.name, &desc.description);

        let occasion = folder.virtual_copy(&occasion_path);
        let parent = format!("/events/{}/{}/", desc.name, year);
        if let Err(err) = tree.insert(&parent, occasion) {
            warn!(path = %occasion_path, %err, "event occasion rejected");
            continue;
        }

        for child_path in &folder.children {
            let Some(child) = tree.get(child_path) else {
                continue;
            };
            if child.is_folder() {
                // Events re-project direct photo children only.
                continue;
            }
            let Some(leaf) = paths::leaf_fragment(child_path) else {
                continue;
            };
            let dest = paths::join(&occasion_path, leaf);
            match tree.insert(&occasion_path, child.virtual_copy(&dest)) {
                Ok(()) => created += 1,
                Err(err) => warn!(path = %dest, %err, "event entry rejected"),
            }
        }
    }

    debug!(created, "event synthesis complete");
    created
}

fn annotate_event_root(tree: &GalleryTree, name: &str, description: &str) {
    // ensure_parent_folders gave the event root a fragment-derived title;
    // attach the rule's description once.
    let path = format!("/events/{name}/");
    tree.update(&path, |entry| {
        if entry.description.is_none() {
            entry.description = Some(description.to_string());
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::GalleryEntry;

    fn seeded_tree() -> GalleryTree {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/2020-12-25-christmas-morning/img-1/")
            .unwrap();
        for leaf in ["img-1", "img-2"] {
            let path = format!("/albums/2020-12-25-christmas-morning/{leaf}/");
            tree.insert(
                "/albums/2020-12-25-christmas-morning/",
                GalleryEntry::folder(&path, leaf),
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn builtin_registry_compiles() {
        let registry = EventRegistry::builtin();
        assert!(!registry.is_empty());
    }

    #[test]
    fn match_requires_date_prefix() {
        let registry = EventRegistry::builtin();
        assert!(registry.match_folder("2020-12-25-christmas").is_some());
        assert!(registry.match_folder("christmas-album").is_none());
    }

    #[test]
    fn first_match_wins() {
        let mut registry = EventRegistry::builtin();
        registry.push(
            EventDesc::new("christmas-eve", r"^\d{4}-12-24.*christmas", "Eve").unwrap(),
        );
        // Both built-in christmas and the custom rule match; built-in is first.
        let desc = registry.match_folder("2020-12-24-christmas-eve").unwrap();
        assert_eq!(desc.name, "christmas");
    }

    #[test]
    fn synthesize_reprojects_photo_children() {
        let tree = seeded_tree();
        let created = synthesize(&tree, &EventRegistry::builtin());
        assert_eq!(created, 2);

        let entry = tree
            .get("/events/christmas/2020/2020-12-25-christmas-morning/img-1/")
            .unwrap();
        assert_eq!(
            entry.original_album_path.as_deref(),
            Some("/albums/2020-12-25-christmas-morning/img-1/")
        );

        let occasion = tree
            .get("/events/christmas/2020/2020-12-25-christmas-morning/")
            .unwrap();
        assert_eq!(occasion.children.len(), 2);
        assert_eq!(
            occasion.original_album_path.as_deref(),
            Some("/albums/2020-12-25-christmas-morning/")
        );
    }

    #[test]
    fn event_root_carries_rule_description() {
        let tree = seeded_tree();
        synthesize(&tree, &EventRegistry::builtin());
        let root = tree.get("/events/christmas/").unwrap();
        assert!(root.description.as_deref().unwrap().contains("Christmas"));
    }

    #[test]
    fn unmatched_folders_are_ignored() {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/2020-05-17-beach/img-1/")
            .unwrap();
        let created = synthesize(&tree, &EventRegistry::builtin());
        assert_eq!(created, 0);
        assert!(!tree.contains("/events/"));
    }
}
