//! Sibling navigation and breadcrumbs.
//!
//! Operates on the read-phase view of the tree (a plain map), after all
//! writers have joined. Siblings are ordered by path ascending — stable
//! because upstream path construction embeds zero-padded dates — and hidden
//! entries are invisible to navigation.
//!
//! ## Suppression rules
//!
//! - `first`/`last` are null when they would point at the entry itself.
//! - `previous` is null when it would duplicate the `first` link, and
//!   `next` when it would duplicate `last`.
//!
//! Without suppression a single-child folder's navigation would point at
//! itself, producing spurious "next page" links.

use crate::paths;
use crate::tree::GalleryEntry;
use crate::types::GalleryChildItem;
use std::collections::BTreeMap;

/// The computed first/previous/next/last links for one entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NavigationLinks {
    pub first: Option<GalleryChildItem>,
    pub previous: Option<GalleryChildItem>,
    pub next: Option<GalleryChildItem>,
    pub last: Option<GalleryChildItem>,
}

fn child_ref(entry: &GalleryEntry) -> GalleryChildItem {
    GalleryChildItem {
        path: entry.path.clone(),
        title: entry.title.clone(),
    }
}

/// Resolve navigation links for `entry` against its parent's children.
pub fn links(
    entries: &BTreeMap<String, GalleryEntry>,
    entry: &GalleryEntry,
) -> NavigationLinks {
    let Some(parent_path) = paths::parent(&entry.path) else {
        return NavigationLinks::default();
    };
    let Some(parent) = entries.get(&parent_path) else {
        return NavigationLinks::default();
    };

    // Parent children are kept path-ascending by the tree.
    let siblings: Vec<&GalleryEntry> = parent
        .children
        .iter()
        .filter_map(|path| entries.get(path))
        .filter(|sibling| !sibling.hidden)
        .collect();

    let Some(first_sibling) = siblings.first() else {
        return NavigationLinks::default();
    };
    let last_sibling = siblings.last().unwrap_or(first_sibling);

    let first = (first_sibling.path != entry.path).then(|| child_ref(first_sibling));
    let last = (last_sibling.path != entry.path).then(|| child_ref(last_sibling));

    let previous = siblings
        .iter()
        .filter(|s| s.path < entry.path)
        .next_back()
        .filter(|s| s.path != first_sibling.path)
        .map(|s| child_ref(s));
    let next = siblings
        .iter()
        .find(|s| s.path > entry.path)
        .filter(|s| s.path != last_sibling.path)
        .map(|s| child_ref(s));

    NavigationLinks {
        first,
        previous,
        next,
        last,
    }
}

/// The ordered projection of every strict ancestor of `path`, from the root
/// down. A missing ancestor degrades to an empty list rather than an error;
/// given the tree's insert invariant it should not occur.
pub fn breadcrumbs(
    entries: &BTreeMap<String, GalleryEntry>,
    path: &str,
) -> Vec<GalleryChildItem> {
    let mut chain = Vec::new();
    for ancestor in paths::ancestors(path) {
        match entries.get(&ancestor) {
            Some(entry) => chain.push(child_ref(entry)),
            None => return Vec::new(),
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::GalleryTree;

    fn tree_with_children(leaves: &[&str]) -> BTreeMap<String, GalleryEntry> {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/trip/x/").unwrap();
        for leaf in leaves {
            let path = format!("/albums/trip/{leaf}/");
            tree.insert("/albums/trip/", GalleryEntry::folder(&path, *leaf))
                .unwrap();
        }
        tree.snapshot()
    }

    fn link_path(link: &Option<GalleryChildItem>) -> Option<&str> {
        link.as_ref().map(|l| l.path.as_str())
    }

    #[test]
    fn middle_sibling_gets_all_four_links() {
        let entries = tree_with_children(&["a", "b", "c", "d", "e"]);
        let nav = links(&entries, &entries["/albums/trip/c/"]);

        assert_eq!(link_path(&nav.first), Some("/albums/trip/a/"));
        assert_eq!(link_path(&nav.previous), Some("/albums/trip/b/"));
        assert_eq!(link_path(&nav.next), Some("/albums/trip/d/"));
        assert_eq!(link_path(&nav.last), Some("/albums/trip/e/"));
    }

    #[test]
    fn first_suppressed_for_first_sibling() {
        let entries = tree_with_children(&["a", "b", "c"]);
        let nav = links(&entries, &entries["/albums/trip/a/"]);

        assert_eq!(nav.first, None);
        assert_eq!(nav.previous, None);
        assert_eq!(link_path(&nav.next), Some("/albums/trip/b/"));
        assert_eq!(link_path(&nav.last), Some("/albums/trip/c/"));
    }

    #[test]
    fn previous_suppressed_when_duplicating_first() {
        let entries = tree_with_children(&["a", "b", "c"]);
        let nav = links(&entries, &entries["/albums/trip/b/"]);

        assert_eq!(link_path(&nav.first), Some("/albums/trip/a/"));
        // previous would be "a", which duplicates first.
        assert_eq!(nav.previous, None);
        assert_eq!(nav.next, None); // "c" duplicates last
        assert_eq!(link_path(&nav.last), Some("/albums/trip/c/"));
    }

    #[test]
    fn single_child_has_no_links() {
        let entries = tree_with_children(&["only"]);
        let nav = links(&entries, &entries["/albums/trip/only/"]);
        assert_eq!(nav, NavigationLinks::default());
    }

    #[test]
    fn hidden_siblings_are_invisible() {
        let tree = GalleryTree::new();
        tree.ensure_parent_folders("/albums/trip/x/").unwrap();
        for (leaf, hidden) in [("a", false), ("b", true), ("c", false), ("d", false)] {
            let path = format!("/albums/trip/{leaf}/");
            let mut entry = GalleryEntry::folder(&path, leaf);
            entry.hidden = hidden;
            tree.insert("/albums/trip/", entry).unwrap();
        }
        let entries = tree.snapshot();

        let nav = links(&entries, &entries["/albums/trip/c/"]);
        // "b" is hidden, so previous skips to "a" — which is first, so
        // suppression nulls it.
        assert_eq!(link_path(&nav.first), Some("/albums/trip/a/"));
        assert_eq!(nav.previous, None);
        assert_eq!(nav.next, None);
        assert_eq!(link_path(&nav.last), Some("/albums/trip/d/"));
    }

    #[test]
    fn adjacent_siblings_are_symmetric() {
        let entries = tree_with_children(&["a", "b", "c", "d"]);
        let nav_b = links(&entries, &entries["/albums/trip/b/"]);
        let nav_c = links(&entries, &entries["/albums/trip/c/"]);

        assert_eq!(link_path(&nav_b.next), Some("/albums/trip/c/"));
        assert_eq!(link_path(&nav_c.previous), Some("/albums/trip/b/"));
    }

    #[test]
    fn breadcrumbs_walk_strict_ancestors() {
        let entries = tree_with_children(&["a"]);
        let chain = breadcrumbs(&entries, "/albums/trip/a/");
        let paths: Vec<&str> = chain.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/albums/", "/albums/trip/"]);
    }

    #[test]
    fn breadcrumbs_degrade_to_empty_on_missing_ancestor() {
        let entries = BTreeMap::new();
        assert!(breadcrumbs(&entries, "/albums/trip/a/").is_empty());
    }

    #[test]
    fn root_has_no_breadcrumbs_or_links() {
        let entries = tree_with_children(&["a"]);
        assert!(breadcrumbs(&entries, "/").is_empty());
        let nav = links(&entries, &entries["/"]);
        assert_eq!(nav, NavigationLinks::default());
    }
}
