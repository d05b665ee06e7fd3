//! Site index assembly.
//!
//! A pure projection from the read-phase tree view into the external
//! snapshot shape: every entry becomes a [`GalleryItem`] with computed
//! navigation and breadcrumbs, non-hidden children sorted by path, and a
//! stable overall item ordering by path. Collections default to empty,
//! never null.

use crate::navigation;
use crate::tree::GalleryEntry;
use crate::types::{GalleryChildItem, GalleryItem};
use std::collections::BTreeMap;

/// Project the whole tree view into the snapshot item list, ordered by path.
pub fn assemble(entries: &BTreeMap<String, GalleryEntry>) -> Vec<GalleryItem> {
    // BTreeMap iteration already yields path-ascending order.
    entries
        .values()
        .map(|entry| project(entries, entry))
        .collect()
}

fn project(entries: &BTreeMap<String, GalleryEntry>, entry: &GalleryEntry) -> GalleryItem {
    let nav = navigation::links(entries, entry);

    let children: Vec<GalleryChildItem> = entry
        .children
        .iter()
        .filter_map(|path| entries.get(path))
        .filter(|child| !child.hidden)
        .map(|child| GalleryChildItem {
            path: child.path.clone(),
            title: child.title.clone(),
        })
        .collect();

    GalleryItem {
        path: entry.path.clone(),
        breadcrumb_path: crate::paths::breadcrumb(&entry.path),
        title: entry.title.clone(),
        description: entry.description.clone(),
        location: entry.location,
        date_created: entry.date_created,
        date_updated: entry.date_updated,
        rating: entry.rating,
        metadata: entry.metadata.clone(),
        keywords: entry.keywords.clone(),
        image_sizes: entry.image_sizes.clone(),
        children,
        breadcrumbs: navigation::breadcrumbs(entries, &entry.path),
        first: nav.first,
        previous: nav.previous,
        next: nav.next,
        last: nav.last,
        original_album_path: entry.original_album_path.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::GalleryTree;
    use crate::types::ItemKind;

    fn seeded_view() -> BTreeMap<String, GalleryEntry> {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/trip/x/").unwrap();
        for leaf in ["b", "a", "c"] {
            let path = format!("/albums/trip/{leaf}/");
            tree.insert("/albums/trip/", GalleryEntry::folder(&path, leaf))
                .unwrap();
        }
        tree.snapshot()
    }

    #[test]
    fn items_ordered_by_path() {
        let items = assemble(&seeded_view());
        let paths: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn every_entry_is_projected() {
        let view = seeded_view();
        let items = assemble(&view);
        assert_eq!(items.len(), view.len());
    }

    #[test]
    fn folder_and_photo_kinds_follow_children() {
        let items = assemble(&seeded_view());
        let trip = items.iter().find(|i| i.path == "/albums/trip/").unwrap();
        assert_eq!(trip.kind(), ItemKind::Folder);
        assert_eq!(trip.children.len(), 3);

        let leaf = items.iter().find(|i| i.path == "/albums/trip/a/").unwrap();
        assert_eq!(leaf.kind(), ItemKind::Photo);
    }

    #[test]
    fn hidden_children_excluded_from_listings() {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/trip/x/").unwrap();
        let mut hidden = GalleryEntry::folder("/albums/trip/h/", "h");
        hidden.hidden = true;
        tree.insert("/albums/trip/", hidden).unwrap();
        tree.insert(
            "/albums/trip/",
            GalleryEntry::folder("/albums/trip/a/", "a"),
        )
        .unwrap();

        let items = assemble(&tree.snapshot());
        let trip = items.iter().find(|i| i.path == "/albums/trip/").unwrap();
        assert_eq!(trip.children.len(), 1);
        assert_eq!(trip.children[0].path, "/albums/trip/a/");
    }

    #[test]
    fn projection_carries_breadcrumbs_and_nav() {
        let items = assemble(&seeded_view());
        let b = items.iter().find(|i| i.path == "/albums/trip/b/").unwrap();

        assert_eq!(b.breadcrumb_path, "\\albums\\trip\\b\\");
        assert_eq!(b.breadcrumbs.len(), 3);
        assert_eq!(b.first.as_ref().unwrap().path, "/albums/trip/a/");
        assert_eq!(b.last.as_ref().unwrap().path, "/albums/trip/c/");
    }

    #[test]
    fn collections_default_to_empty_in_json() {
        let items = assemble(&seeded_view());
        let leaf = items.iter().find(|i| i.path == "/albums/trip/a/").unwrap();
        let json = serde_json::to_value(leaf).unwrap();
        // Empty collections are omitted on the wire and default on read —
        // no nulls either way.
        assert!(json.get("metadata").is_none());
        let back: GalleryItem = serde_json::from_value(json).unwrap();
        assert!(back.metadata.is_empty());
        assert!(back.keywords.is_empty());
    }
}
