//! Shared types serialized between pipeline stages.
//!
//! These types cross three persistence boundaries — the photo record input
//! document, the published snapshot, and the upload queue files — and must
//! stay wire-compatible across runs: a queue file written by one run is
//! drained by a later one.

use crate::geo::Location;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ordered name/value metadata pair extracted from a photo.
///
/// Order matters: resolution of well-known names (Title, Keywords, ...) takes
/// the first occurrence, matching the extractor's precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataPair {
    pub name: String,
    pub value: String,
}

impl MetadataPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A generated rendition of a photo at a particular size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Variant name, e.g. `"thumbnail"` or `"1400"`.
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A per-photo metadata record produced by the external repository loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    /// Content-derived identity hash of the source file.
    pub path_hash: String,
    /// Original repository path, e.g. `"2020-05-17-beach/IMG_1234.jpg"`.
    pub base_path: String,
    /// URL-safe relative path, e.g. `"2020-05-17-beach/img-1234"`.
    pub url_safe_path: String,
    /// Ordered name/value metadata extracted from EXIF/XMP.
    #[serde(default)]
    pub metadata: Vec<MetadataPair>,
    #[serde(default)]
    pub image_sizes: Vec<ImageSize>,
    /// From the source file mtime.
    pub date_created: DateTime<Utc>,
    /// Later of file mtime and EXIF "date taken".
    pub date_updated: DateTime<Utc>,
}

impl Photo {
    /// First metadata value with the given name, case-insensitively.
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|pair| pair.name.eq_ignore_ascii_case(name))
            .map(|pair| pair.value.as_str())
    }

    /// Display title: the `Title` metadata entry, falling back to a
    /// title-cased leaf fragment of the URL-safe path.
    pub fn title(&self) -> String {
        match self.metadata_value("Title") {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => paths::leaf_fragment(&self.url_safe_path)
                .map(paths::fragment_title)
                .unwrap_or_default(),
        }
    }

    pub fn description(&self) -> Option<String> {
        self.metadata_value("Caption")
            .or_else(|| self.metadata_value("Description"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Keyword tokens from the `Keywords` metadata entry, split on
    /// semicolons and commas, trimmed, empties dropped.
    pub fn keywords(&self) -> Vec<String> {
        self.metadata_value("Keywords")
            .map(|raw| {
                raw.split([';', ','])
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rating(&self) -> Option<f32> {
        self.metadata_value("Rating")?.trim().parse().ok()
    }

    pub fn hidden(&self) -> bool {
        self.metadata_value("Hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    pub fn location(&self) -> Option<Location> {
        let lat: f64 = self.metadata_value("GPSLatitude")?.trim().parse().ok()?;
        let lon: f64 = self.metadata_value("GPSLongitude")?.trim().parse().ok()?;
        Some(Location::new(lat, lon))
    }

    /// Canonical album path of this photo: `/albums/{url_safe_path}/`.
    pub fn album_path(&self) -> String {
        paths::join("/albums/", &self.url_safe_path)
    }
}

/// Whether an assembled item is a folder or a photo. Derived from the
/// children list, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ItemKind {
    Photo,
    Folder,
}

/// A compact reference to another item, used for navigation links,
/// child listings, and breadcrumbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryChildItem {
    pub path: String,
    pub title: String,
}

/// The read-only projection of a tree entry into the published site index.
///
/// Collections default to empty, never null, so downstream consumers need
/// no null checks. Navigation fields are computed at assembly time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub path: String,
    /// Backslash-separated breadcrumb form of `path`.
    pub breadcrumb_path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataPair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_sizes: Vec<ImageSize>,
    /// Non-hidden children ordered by path ascending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GalleryChildItem>,
    /// Strict ancestor chain from the root down.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<GalleryChildItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<GalleryChildItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<GalleryChildItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<GalleryChildItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<GalleryChildItem>,
    /// Set only on virtual entries (keyword/event hierarchies), pointing
    /// back at the real album item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_album_path: Option<String>,
}

impl GalleryItem {
    pub fn kind(&self) -> ItemKind {
        if self.children.is_empty() {
            ItemKind::Photo
        } else {
            ItemKind::Folder
        }
    }

}

/// One complete, versioned serialization of the gallery tree. Both the
/// publish output and the diff baseline, and — with a single item or a
/// single deleted path — the per-mutation wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GallerySiteIndex {
    pub version: u64,
    #[serde(default)]
    pub items: Vec<GalleryItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deleted_items: Vec<String>,
}

impl GallerySiteIndex {
    /// Wire envelope carrying one new/updated item.
    pub fn item_envelope(version: u64, item: GalleryItem) -> Self {
        Self {
            version,
            items: vec![item],
            deleted_items: Vec::new(),
        }
    }

    /// Wire envelope carrying one deleted path.
    pub fn deletion_envelope(version: u64, path: String) -> Self {
        Self {
            version,
            items: Vec::new(),
            deleted_items: vec![path],
        }
    }
}

/// The kind of mutation a queue item carries to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    New,
    Update,
    Delete,
}

/// One pending mutation, persisted as a JSON file in the queue directory
/// until delivered or superseded by a newer enqueue for the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadQueueItem {
    /// Canonical path of the target item; the queue's identity key.
    pub path: String,
    pub upload_type: UploadType,
    /// Snapshot version this mutation belongs to.
    pub version: u64,
    /// The item payload. `None` for deletions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<GalleryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn photo(url_safe_path: &str, metadata: Vec<MetadataPair>) -> Photo {
        let stamp = Utc.with_ymd_and_hms(2020, 5, 17, 12, 0, 0).unwrap();
        Photo {
            path_hash: format!("hash-{url_safe_path}"),
            base_path: format!("{url_safe_path}.jpg"),
            url_safe_path: url_safe_path.to_string(),
            metadata,
            image_sizes: vec![],
            date_created: stamp,
            date_updated: stamp,
        }
    }

    #[test]
    fn metadata_lookup_is_case_insensitive_first_match() {
        let p = photo(
            "a/b",
            vec![
                MetadataPair::new("title", "First"),
                MetadataPair::new("Title", "Second"),
            ],
        );
        assert_eq!(p.title(), "First");
    }

    #[test]
    fn title_falls_back_to_leaf_fragment() {
        let p = photo("2020-05-17-beach/img-0042", vec![]);
        assert_eq!(p.title(), "Img 0042");
    }

    #[test]
    fn keywords_split_on_semicolons_and_commas() {
        let p = photo(
            "a/b",
            vec![MetadataPair::new("Keywords", "beach; family ,sunset,, ")],
        );
        assert_eq!(p.keywords(), vec!["beach", "family", "sunset"]);
    }

    #[test]
    fn location_requires_both_coordinates() {
        let p = photo("a/b", vec![MetadataPair::new("GPSLatitude", "51.5")]);
        assert!(p.location().is_none());

        let p = photo(
            "a/b",
            vec![
                MetadataPair::new("GPSLatitude", "51.5"),
                MetadataPair::new("GPSLongitude", "-0.12"),
            ],
        );
        assert_eq!(p.location(), Some(Location::new(51.5, -0.12)));
    }

    #[test]
    fn album_path_is_canonical() {
        let p = photo("2020-05-17-beach/img-0042", vec![]);
        assert_eq!(p.album_path(), "/albums/2020-05-17-beach/img-0042/");
    }

    #[test]
    fn item_kind_derived_from_children() {
        let mut item = GalleryItem {
            path: "/albums/x/".into(),
            breadcrumb_path: "\\albums\\x\\".into(),
            title: "X".into(),
            description: None,
            location: None,
            date_created: None,
            date_updated: None,
            rating: None,
            metadata: vec![],
            keywords: vec![],
            image_sizes: vec![],
            children: vec![],
            breadcrumbs: vec![],
            first: None,
            previous: None,
            next: None,
            last: None,
            original_album_path: None,
        };
        assert_eq!(item.kind(), ItemKind::Photo);

        item.children.push(GalleryChildItem {
            path: "/albums/x/y/".into(),
            title: "Y".into(),
        });
        assert_eq!(item.kind(), ItemKind::Folder);
    }
}
