//! The sync pipeline.
//!
//! One run wires the whole crate together:
//!
//! 1. ingest the photo records into the gallery tree in parallel
//! 2. synthesize the virtual keyword and event hierarchies
//! 3. backfill folder locations from child centroids
//! 4. assemble the tree into the flat site index
//! 5. diff against the last published snapshot
//! 6. persist the new snapshot and enqueue the changes
//! 7. optionally drain the queue through the transport
//!
//! Per-photo anomalies (empty paths, duplicate destinations) are logged and
//! skipped so one bad record never aborts a run. A run whose content is
//! identical to the baseline is a no-op: nothing is written, nothing is
//! queued, and re-running on unchanged data costs nothing.

use crate::assemble;
use crate::config::{self, ConfigError, SyncConfig};
use crate::diff::{self, DiffResult};
use crate::events;
use crate::keywords;
use crate::queue::{DrainStats, QueueDrainer, QueueError, Transport, UploadQueue};
use crate::snapshot::{self, SnapshotError};
use crate::tree::{GalleryEntry, GalleryTree};
use crate::types::{Photo, UploadQueueItem, UploadType};
use crate::paths;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Per-run switches, set from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Bypass the identical-content short-circuit and republish everything.
    pub force: bool,
    /// Lift the per-run delivery quota.
    pub no_quota: bool,
    /// Drain the queue after enqueuing. `false` builds the index and queue
    /// only.
    pub drain: bool,
}

/// What one run did, for the summary printer.
#[derive(Debug, Default)]
pub struct RunReport {
    pub photos: usize,
    /// Records skipped over anomalies during ingestion.
    pub skipped: usize,
    pub keyword_entries: usize,
    pub event_entries: usize,
    /// Total tree entries after synthesis.
    pub tree_entries: usize,
    pub version: u64,
    pub new_items: usize,
    pub updated_items: usize,
    pub deleted_items: usize,
    pub unchanged_items: usize,
    pub no_op: bool,
    pub queued: usize,
    pub drain: Option<DrainStats>,
}

/// Execute one sync run end to end.
pub fn run(
    photos: &[Photo],
    config: &SyncConfig,
    transport: &dyn Transport,
    opts: RunOptions,
) -> Result<RunReport, PipelineError> {
    let registry = config.event_registry()?;
    let tree = GalleryTree::new();
    let mut report = RunReport {
        photos: photos.len(),
        ..RunReport::default()
    };

    // Phase 1: parallel ingestion. The tree is the only shared state; its
    // mutex is held per insert.
    let skipped = AtomicUsize::new(0);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config::effective_threads(&config.processing))
        .build()?;
    pool.install(|| {
        photos.par_iter().for_each(|photo| {
            if !ingest(&tree, photo) {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
        });
    });
    report.skipped = skipped.load(Ordering::Relaxed);

    // Phase 2: virtual hierarchies. Keywords and events touch disjoint
    // destination subtrees, so the two passes run side by side.
    let (keyword_entries, event_entries) = rayon::join(
        || keywords::synthesize(&tree, photos, config.keywords.max_photos_per_keyword),
        || events::synthesize(&tree, &registry),
    );
    report.keyword_entries = keyword_entries;
    report.event_entries = event_entries;

    tree.backfill_locations();
    report.tree_entries = tree.len();

    // Read phase: one clone of the finished tree, no further locking.
    let entries = tree.snapshot();
    let items = assemble::assemble(&entries);

    let snapshot_path = Path::new(&config.snapshot_path);
    let previous = snapshot::load(snapshot_path);
    let result = diff::diff(previous.as_ref(), items, opts.force)?;

    report.version = result.snapshot.version;
    report.new_items = result.new_items.len();
    report.updated_items = result.updated_items.len();
    report.deleted_items = result.deleted.len();
    report.unchanged_items = result.unchanged;
    report.no_op = result.no_op;

    if result.no_op {
        info!("no changes since last run, nothing to publish");
    } else {
        snapshot::save(snapshot_path, &result.snapshot)?;
        let queue = UploadQueue::open(&config.queue_dir)?;
        report.queued = enqueue_changes(&queue, &result)?;
    }

    if opts.drain {
        let queue = UploadQueue::open(&config.queue_dir)?;
        let quota = if opts.no_quota {
            None
        } else {
            config.sync.quota
        };
        let drainer = QueueDrainer::new(&queue, transport, quota, config.sync.retry_attempts);
        report.drain = Some(drainer.drain()?);
    }

    Ok(report)
}

/// Insert one photo record into the tree. Returns whether it landed.
fn ingest(tree: &GalleryTree, photo: &Photo) -> bool {
    if photo.url_safe_path.trim().is_empty() {
        warn!(base_path = %photo.base_path, "photo record has no url-safe path, skipping");
        return false;
    }
    let path = photo.album_path();
    let Some(parent) = paths::parent(&path) else {
        warn!(%path, "photo path has no parent, skipping");
        return false;
    };
    if let Err(err) = tree.ensure_parent_folders(&path) {
        warn!(%path, %err, "could not create parent folders, skipping photo");
        return false;
    }

    let entry = GalleryEntry {
        path: path.clone(),
        title: photo.title(),
        description: photo.description(),
        location: photo.location(),
        date_created: Some(photo.date_created),
        date_updated: Some(photo.date_updated),
        rating: photo.rating(),
        metadata: photo.metadata.clone(),
        keywords: photo.keywords(),
        image_sizes: photo.image_sizes.clone(),
        children: Vec::new(),
        original_album_path: None,
        hidden: photo.hidden(),
    };
    match tree.insert(&parent, entry) {
        Ok(()) => true,
        Err(err) => {
            warn!(%path, %err, "photo rejected by tree, skipping");
            false
        }
    }
}

/// Queue every classified change. Deletions carry no payload.
fn enqueue_changes(queue: &UploadQueue, result: &DiffResult) -> Result<usize, QueueError> {
    let version = result.snapshot.version;
    let mut queued = 0;

    for (items, upload_type) in [
        (&result.new_items, UploadType::New),
        (&result.updated_items, UploadType::Update),
    ] {
        for item in items {
            queue.enqueue(&UploadQueueItem {
                path: item.path.clone(),
                upload_type,
                version,
                item: Some(item.clone()),
            })?;
            queued += 1;
        }
    }
    for path in &result.deleted {
        queue.enqueue(&UploadQueueItem {
            path: path.clone(),
            upload_type: UploadType::Delete,
            version,
            item: None,
        })?;
        queued += 1;
    }

    info!(queued, version, "changes queued");
    Ok(queued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GallerySiteIndex, ImageSize, MetadataPair};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn photo(url_safe_path: &str, metadata: Vec<MetadataPair>) -> Photo {
        Photo {
            path_hash: format!("hash-{url_safe_path}"),
            base_path: url_safe_path.to_string(),
            url_safe_path: url_safe_path.to_string(),
            metadata,
            image_sizes: vec![ImageSize {
                name: "small".to_string(),
                url: format!("https://cdn/{url_safe_path}-s.jpg"),
                width: 400,
                height: 300,
            }],
            date_created: Utc.with_ymd_and_hms(2020, 5, 17, 12, 0, 0).unwrap(),
            date_updated: Utc.with_ymd_and_hms(2020, 5, 17, 12, 0, 0).unwrap(),
        }
    }

    fn test_config(tmp: &TempDir) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.snapshot_path = tmp
            .path()
            .join("gallery-index.json")
            .to_string_lossy()
            .to_string();
        config.queue_dir = tmp.path().join("queue").to_string_lossy().to_string();
        config
    }

    /// Counts deliveries; always succeeds.
    #[derive(Default)]
    struct CountingTransport {
        sent: Mutex<Vec<String>>,
    }

    impl Transport for CountingTransport {
        fn send(&self, envelope: &GallerySiteIndex) -> Result<(), crate::queue::TransportError> {
            let target = envelope
                .items
                .first()
                .map(|i| i.path.clone())
                .or_else(|| envelope.deleted_items.first().cloned())
                .unwrap_or_default();
            self.sent.lock().unwrap().push(target);
            Ok(())
        }
    }

    // =========================================================================
    // Full run
    // =========================================================================

    #[test]
    fn first_run_publishes_everything() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let photos = vec![
            photo("2020/2020-05-17-beach-trip/wave", vec![]),
            photo("2020/2020-05-17-beach-trip/dunes", vec![]),
        ];
        let transport = CountingTransport::default();

        let report = run(
            &photos,
            &config,
            &transport,
            RunOptions {
                drain: true,
                ..RunOptions::default()
            },
        )
        .unwrap();

        assert_eq!(report.photos, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.version, 1);
        assert!(report.new_items >= 2);
        assert_eq!(report.updated_items, 0);
        assert_eq!(report.deleted_items, 0);
        assert!(!report.no_op);
        // Everything queued was delivered.
        let drain = report.drain.unwrap();
        assert_eq!(drain.delivered as usize, report.queued);
        assert_eq!(drain.remaining, 0);
        assert!(Path::new(&config.snapshot_path).exists());
    }

    #[test]
    fn rerun_on_unchanged_data_is_no_op() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let photos = vec![photo("2020/2020-05-17-beach-trip/wave", vec![])];
        let transport = CountingTransport::default();
        let opts = RunOptions {
            drain: true,
            ..RunOptions::default()
        };

        let first = run(&photos, &config, &transport, opts).unwrap();
        assert!(!first.no_op);
        let sent_after_first = transport.sent.lock().unwrap().len();

        let second = run(&photos, &config, &transport, opts).unwrap();
        assert!(second.no_op);
        assert_eq!(second.version, first.version);
        assert_eq!(second.queued, 0);
        assert_eq!(transport.sent.lock().unwrap().len(), sent_after_first);
        // The snapshot file was not rewritten, so no backup appeared.
        let backups = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("gallery-index-")
            })
            .count();
        assert_eq!(backups, 0);
    }

    #[test]
    fn removing_a_photo_queues_a_delete() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let transport = CountingTransport::default();
        let opts = RunOptions {
            drain: true,
            ..RunOptions::default()
        };

        let photos = vec![
            photo("2020/trip/wave", vec![]),
            photo("2020/trip/dunes", vec![]),
        ];
        run(&photos, &config, &transport, opts).unwrap();

        let remaining = vec![photo("2020/trip/wave", vec![])];
        let report = run(&remaining, &config, &transport, opts).unwrap();

        assert_eq!(report.deleted_items, 1);
        assert_eq!(report.version, 2);
        assert!(
            transport
                .sent
                .lock()
                .unwrap()
                .contains(&"/albums/2020/trip/dunes/".to_string())
        );
    }

    #[test]
    fn force_republishes_unchanged_content() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let transport = CountingTransport::default();
        let photos = vec![photo("2020/trip/wave", vec![])];

        run(
            &photos,
            &config,
            &transport,
            RunOptions {
                drain: true,
                ..RunOptions::default()
            },
        )
        .unwrap();
        let report = run(
            &photos,
            &config,
            &transport,
            RunOptions {
                force: true,
                drain: true,
                ..RunOptions::default()
            },
        )
        .unwrap();

        assert!(!report.no_op);
        assert_eq!(report.version, 2);
        assert!(report.new_items > 0);
    }

    #[test]
    fn anomalous_records_are_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let transport = CountingTransport::default();

        let photos = vec![
            photo("2020/trip/wave", vec![]),
            photo("", vec![]),
            // Duplicate destination path.
            photo("2020/trip/wave", vec![]),
        ];
        let report = run(&photos, &config, &transport, RunOptions::default()).unwrap();

        assert_eq!(report.photos, 3);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn keywords_and_events_are_synthesized() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let transport = CountingTransport::default();

        let photos = vec![photo(
            "2020-12-25-christmas-morning/tree",
            vec![MetadataPair::new("Keywords", "family; holidays")],
        )];
        let report = run(&photos, &config, &transport, RunOptions::default()).unwrap();

        assert_eq!(report.keyword_entries, 2);
        assert_eq!(report.event_entries, 1);

        let snapshot = snapshot::load(Path::new(&config.snapshot_path)).unwrap();
        let paths: Vec<&str> = snapshot.items.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"/keywords/f/family/2020-12-25-christmas-morning-tree/"));
        assert!(
            paths.contains(&"/events/christmas/2020/2020-12-25-christmas-morning/tree/")
        );
    }

    #[test]
    fn no_drain_leaves_queue_populated() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let transport = CountingTransport::default();
        let photos = vec![photo("2020/trip/wave", vec![])];

        let report = run(&photos, &config, &transport, RunOptions::default()).unwrap();

        assert!(report.drain.is_none());
        assert!(transport.sent.lock().unwrap().is_empty());
        let queue = UploadQueue::open(&config.queue_dir).unwrap();
        assert_eq!(queue.len().unwrap(), report.queued);
    }

    #[test]
    fn quota_leaves_overflow_queued_for_next_run() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(&tmp);
        config.sync.quota = Some(2);
        let transport = CountingTransport::default();
        let photos = vec![
            photo("2020/trip/wave", vec![]),
            photo("2020/trip/dunes", vec![]),
            photo("2020/trip/pier", vec![]),
        ];

        let report = run(
            &photos,
            &config,
            &transport,
            RunOptions {
                drain: true,
                ..RunOptions::default()
            },
        )
        .unwrap();

        let drain = report.drain.unwrap();
        assert_eq!(drain.delivered, 2);
        assert!(drain.quota_reached);
        assert!(drain.remaining > 0);
        let queue = UploadQueue::open(&config.queue_dir).unwrap();
        assert_eq!(queue.len().unwrap() as u32, drain.remaining);
    }
}
