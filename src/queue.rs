//! Durable upload queue and drainer.
//!
//! Every classified change is persisted as one JSON file in the queue
//! directory before anything is sent, so a crash between diffing and
//! delivery loses nothing. The filename is the SHA-256 of the target path:
//! re-enqueuing the same path overwrites the existing file, guaranteeing at
//! most one pending mutation per path.
//!
//! ## Drain order
//!
//! Non-delete items first, photo-kind before folder-kind, then path
//! ascending: publishing children before parents avoids transient broken
//! links in a tree-shaped remote representation. Deletes drain only after
//! all non-deletes, and only if quota remains — deferring them avoids
//! destroying content a same-run update would supersede.
//!
//! ## Quota and retry
//!
//! A per-run quota bounds how many items are delivered; hitting it is a
//! logged early stop, not an error, and the remainder waits for the next
//! run. Each item gets a bounded number of delivery attempts; exhausting
//! them leaves the file queued — items are never dropped.

use crate::types::{GallerySiteIndex, ItemKind, UploadQueueItem, UploadType};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Delivery failures reported by a [`Transport`]. A timed-out attempt is an
/// ordinary failure under the retry policy, not a distinct error class.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    #[error("remote rejected envelope: {0}")]
    Rejected(String),
    #[error("delivery attempt timed out")]
    TimedOut,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The remote sync endpoint seam.
///
/// Implementations carry a single new/updated item or a single deleted path
/// per call, framed in the same envelope shape as the full snapshot.
/// Each attempt must be bounded by a timeout internally and surface it as
/// [`TransportError::TimedOut`].
pub trait Transport {
    fn send(&self, envelope: &GallerySiteIndex) -> Result<(), TransportError>;
}

/// Transport that spools every envelope to numbered JSON files in a
/// directory, for offline delivery or inspection.
pub struct SpoolTransport {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl SpoolTransport {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        // Resume numbering after the highest existing envelope; a partially
        // consumed spool must never have a later envelope overwritten.
        let next = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_prefix("envelope-")?
                    .strip_suffix(".json")?
                    .parse::<u64>()
                    .ok()
            })
            .max()
            .map_or(0, |max| max + 1);
        Ok(Self {
            dir,
            sequence: AtomicU64::new(next),
        })
    }
}

impl Transport for SpoolTransport {
    fn send(&self, envelope: &GallerySiteIndex) -> Result<(), TransportError> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("envelope-{seq:06}.json"));
        let json = serde_json::to_string_pretty(envelope)
            .map_err(|err| TransportError::Rejected(err.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Transport that logs envelopes and succeeds. Used when no remote is
/// configured.
pub struct DryRunTransport;

impl Transport for DryRunTransport {
    fn send(&self, envelope: &GallerySiteIndex) -> Result<(), TransportError> {
        let target = envelope
            .items
            .first()
            .map(|i| i.path.clone())
            .or_else(|| envelope.deleted_items.first().cloned())
            .unwrap_or_default();
        info!(version = envelope.version, path = %target, "dry-run delivery");
        Ok(())
    }
}

/// The on-disk queue of pending mutations.
pub struct UploadQueue {
    dir: PathBuf,
}

impl UploadQueue {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Deterministic queue filename for a target path.
    pub fn file_name(target_path: &str) -> String {
        let digest = Sha256::digest(target_path.as_bytes());
        format!("{digest:x}.json")
    }

    fn file_path(&self, target_path: &str) -> PathBuf {
        self.dir.join(Self::file_name(target_path))
    }

    /// Persist a pending mutation, overwriting any previous queue entry for
    /// the same path.
    pub fn enqueue(&self, item: &UploadQueueItem) -> Result<(), QueueError> {
        let path = self.file_path(&item.path);
        let json = serde_json::to_string_pretty(item)?;
        fs::write(&path, json)?;
        debug!(target = %item.path, file = %path.display(), "queued mutation");
        Ok(())
    }

    /// All pending mutations. Unparseable files are logged and left in
    /// place; they never block the rest of the queue.
    pub fn pending(&self) -> Result<Vec<UploadQueueItem>, QueueError> {
        let mut items = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    warn!(file = %path.display(), %err, "unreadable queue file, skipping");
                    continue;
                }
            };
            match serde_json::from_str::<UploadQueueItem>(&content) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!(file = %path.display(), %err, "unparseable queue file, skipping")
                }
            }
        }
        Ok(items)
    }

    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.pending()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }

    fn remove(&self, target_path: &str) -> Result<(), QueueError> {
        fs::remove_file(self.file_path(target_path))?;
        Ok(())
    }
}

/// Summary of one drain pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub delivered: u32,
    pub failed: u32,
    pub remaining: u32,
    /// True when draining stopped because the quota was reached.
    pub quota_reached: bool,
}

impl fmt::Display for DrainStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} delivered, {} failed, {} remaining",
            self.delivered, self.failed, self.remaining
        )?;
        if self.quota_reached {
            write!(f, " (quota reached)")?;
        }
        Ok(())
    }
}

/// Sequentially delivers queued mutations through a [`Transport`].
pub struct QueueDrainer<'a> {
    queue: &'a UploadQueue,
    transport: &'a dyn Transport,
    /// `None` lifts the per-run quota entirely.
    quota: Option<usize>,
    retry_attempts: u32,
}

impl<'a> QueueDrainer<'a> {
    pub fn new(
        queue: &'a UploadQueue,
        transport: &'a dyn Transport,
        quota: Option<usize>,
        retry_attempts: u32,
    ) -> Self {
        Self {
            queue,
            transport,
            quota,
            retry_attempts: retry_attempts.max(1),
        }
    }

    /// Drain the queue: non-deletes in publish order, then deletes, within
    /// quota. Failed items stay queued for a future run.
    pub fn drain(&self) -> Result<DrainStats, QueueError> {
        let pending = self.queue.pending()?;
        let (deletes, mut uploads): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|item| item.upload_type == UploadType::Delete);

        // Photos before folders, then path ascending, so children publish
        // before their parents.
        uploads.sort_by(|a, b| {
            let kind = |item: &UploadQueueItem| {
                item.item
                    .as_ref()
                    .map(|i| i.kind())
                    .unwrap_or(ItemKind::Photo)
            };
            kind(a).cmp(&kind(b)).then_with(|| a.path.cmp(&b.path))
        });
        let mut deletes = deletes;
        deletes.sort_by(|a, b| a.path.cmp(&b.path));

        let mut stats = DrainStats::default();
        let total = uploads.len() + deletes.len();

        for item in uploads.into_iter().chain(deletes) {
            if self
                .quota
                .is_some_and(|quota| stats.delivered as usize >= quota)
            {
                info!(quota = self.quota, "upload quota reached, stopping drain");
                stats.quota_reached = true;
                break;
            }
            if self.deliver(&item) {
                self.queue.remove(&item.path)?;
                stats.delivered += 1;
            } else {
                stats.failed += 1;
            }
        }

        stats.remaining = (total - stats.delivered as usize) as u32;
        info!(%stats, "drain pass complete");
        Ok(stats)
    }

    /// Deliver one item with bounded retries. Returns whether delivery was
    /// confirmed.
    fn deliver(&self, item: &UploadQueueItem) -> bool {
        let envelope = match (&item.item, item.upload_type) {
            (_, UploadType::Delete) => {
                GallerySiteIndex::deletion_envelope(item.version, item.path.clone())
            }
            (Some(payload), _) => {
                GallerySiteIndex::item_envelope(item.version, payload.clone())
            }
            (None, _) => {
                warn!(target = %item.path, "queue item missing payload, leaving queued");
                return false;
            }
        };

        for attempt in 1..=self.retry_attempts {
            match self.transport.send(&envelope) {
                Ok(()) => {
                    debug!(target = %item.path, attempt, "delivery confirmed");
                    return true;
                }
                Err(err) => {
                    warn!(
                        target = %item.path,
                        attempt,
                        max = self.retry_attempts,
                        %err,
                        "delivery attempt failed"
                    );
                }
            }
        }
        warn!(target = %item.path, "retries exhausted, item stays queued");
        false
    }
}
