//! Keyword hierarchy synthesis.
//!
//! Every photo's keyword metadata contributes pointer entries under
//! `/keywords/`, giving the site an alternate navigation axis without
//! duplicating underlying photo data. Each (keyword, photo) pair yields one
//! virtual entry at
//!
//! ```text
//! /keywords/{first-letter}/{keyword}/{parent-fragment}-{leaf-fragment}/
//! ```
//!
//! carrying a value copy of the photo entry's metadata plus an
//! `original_album_path` back-reference to the real album item.
//!
//! Keywords normalize to URL-safe slugs before grouping, so "Beach Trip" and
//! "beach trip" land in the same group. Groups whose photo count exceeds the
//! configured ceiling are discarded before synthesis — a keyword on a
//! thousand photos is too generic to make a useful page.

use crate::paths;
use crate::tree::GalleryTree;
use crate::types::Photo;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A keyword and the photos contributing it, keyed by the normalized slug.
#[derive(Debug)]
pub struct KeywordEntry<'a> {
    pub keyword: String,
    pub photos: Vec<&'a Photo>,
}

/// Group photos by normalized keyword and apply the photo-count ceiling.
///
/// Groups come back ordered by keyword for deterministic synthesis.
pub fn group_keywords(photos: &[Photo], max_photos_per_keyword: usize) -> Vec<KeywordEntry<'_>> {
    let mut groups: BTreeMap<String, Vec<&Photo>> = BTreeMap::new();
    for photo in photos {
        for raw in photo.keywords() {
            let slug = paths::url_safe_slug(&raw);
            if slug.is_empty() {
                continue;
            }
            groups.entry(slug).or_default().push(photo);
        }
    }

    groups
        .into_iter()
        .filter(|(keyword, members)| {
            if members.len() > max_photos_per_keyword {
                info!(
                    keyword,
                    photos = members.len(),
                    ceiling = max_photos_per_keyword,
                    "dropping over-ceiling keyword group"
                );
                false
            } else {
                true
            }
        })
        .map(|(keyword, photos)| KeywordEntry { keyword, photos })
        .collect()
}

/// Destination path for one (keyword, photo) pair.
///
/// The `{parent-fragment}-{leaf-fragment}` leaf disambiguates photos that
/// share a filename across albums.
pub fn keyword_entry_path(keyword: &str, photo: &Photo) -> Option<String> {
    let first = keyword.chars().next()?;
    let album_path = photo.album_path();
    let fragments = paths::fragments(&album_path);
    // fragments = ["albums", ...folders, leaf]
    let leaf = fragments.last()?;
    let disambiguated = match fragments.len() {
        0..=2 => (*leaf).to_string(),
        _ => format!("{}-{}", fragments[fragments.len() - 2], leaf),
    };
    Some(format!(
        "/keywords/{first}/{keyword}/{disambiguated}/"
    ))
}

/// Synthesize the `/keywords/` hierarchy into the tree. Returns the number
/// of pointer entries created. Structural anomalies are logged and skipped.
pub fn synthesize(tree: &GalleryTree, photos: &[Photo], max_photos_per_keyword: usize) -> usize {
    let groups = group_keywords(photos, max_photos_per_keyword);
    let mut created = 0;

    for group in &groups {
        for photo in &group.photos {
            let Some(dest) = keyword_entry_path(&group.keyword, photo) else {
                continue;
            };
            let album_path = photo.album_path();
            let Some(album_entry) = tree.get(&album_path) else {
                // The photo never made it into the album tree (its own
                // insert was rejected); nothing to point at.
                debug!(path = %album_path, "skipping keyword entry for absent album item");
                continue;
            };

            if let Err(err) = tree.ensure_parent_folders(&dest) {
                warn!(path = %dest, %err, "keyword folder synthesis failed");
                continue;
            }
            let entry = album_entry.virtual_copy(&dest);
            let Some(parent) = paths::parent(&dest) else {
                continue;
            };
            match tree.insert(&parent, entry) {
                Ok(()) => created += 1,
                Err(err) => warn!(path = %dest, %err, "keyword entry rejected"),
            }
        }
    }

    debug!(groups = groups.len(), created, "keyword synthesis complete");
    created
}
