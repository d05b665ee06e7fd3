//! # Gallery Sync
//!
//! An incremental site-index builder and uploader for photo galleries. An
//! exported photo document is the data source: each record's URL-safe path
//! places it in the album tree, and its metadata feeds titles, keywords,
//! GPS locations, and navigation links.
//!
//! # Architecture: One Run, Seven Phases
//!
//! Every invocation rebuilds the full site index in memory, then syncs only
//! the difference:
//!
//! ```text
//! 1. Ingest     photos.json → gallery tree      (parallel, one entry per photo)
//! 2. Synthesize /keywords/ and /events/         (virtual copies of real entries)
//! 3. Backfill   folder locations                (centroid of child coordinates)
//! 4. Assemble   tree → flat site index          (navigation, breadcrumbs, children)
//! 5. Diff       index vs. last snapshot         (New / Updated / Deleted)
//! 6. Queue      one JSON file per change        (durable, survives crashes)
//! 7. Drain      queue → transport, within quota (bounded retries, nothing dropped)
//! ```
//!
//! Rebuilding everything and diffing turns out simpler and more robust than
//! tracking incremental mutations: the tree build is cheap, the diff is
//! exact, and a corrupt or missing snapshot just degrades to a full
//! republish instead of an inconsistent remote.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Canonical URL and breadcrumb path forms, fragments, titles |
//! | [`types`] | Photo records, site-index items, queue items, wire envelopes |
//! | [`geo`] | Coordinates and spherical centroids for folder locations |
//! | [`tree`] | The mutex-guarded path→entry tree built during ingestion |
//! | [`keywords`] | `/keywords/{letter}/{keyword}/` virtual hierarchy synthesis |
//! | [`events`] | `/events/{name}/{year}/` synthesis from dated folder patterns |
//! | [`navigation`] | Sibling first/previous/next/last links and breadcrumbs |
//! | [`assemble`] | Tree → flat, ordered site-index projection |
//! | [`diff`] | Snapshot diffing with an identical-content short-circuit |
//! | [`snapshot`] | Snapshot persistence with dated backup rotation |
//! | [`queue`] | Durable upload queue, drain ordering, quota, transports |
//! | [`pipeline`] | Wires the phases into one run |
//! | [`config`] | `gallery-sync.toml` loading and validation |
//! | [`photos`] | Photo document parsing |
//! | [`output`] | Human run summary printed after a run |
//!
//! # Design Decisions
//!
//! ## Paths as Identity
//!
//! Every item is keyed by its canonical "/"-terminated URL path. Virtual
//! entries under `/keywords/` and `/events/` are value copies of real album
//! entries at new paths, carrying an `original_album_path` back-reference —
//! no shared ownership, no reference cycles, and a virtual item survives
//! snapshot serialization as plain data.
//!
//! ## Durable Queue Before Delivery
//!
//! Changes hit disk before any delivery is attempted, one JSON file per
//! target path named by the path's SHA-256. Re-queuing a path overwrites its
//! file, so the queue holds at most one pending mutation per path and a
//! crash between diffing and delivery loses nothing.
//!
//! ## Quota as Pacing, Not Failure
//!
//! Remote endpoints throttle. Instead of erroring at a rate limit, each run
//! delivers up to a configured quota and leaves the rest queued; repeated
//! runs converge. Deletions drain last so a same-run update is never
//! destroyed by an earlier delete.
//!
//! ## No-Op Runs Are Free
//!
//! If the freshly assembled index serializes identically to the last
//! snapshot, the run stops: no version bump, no snapshot rewrite, no queue
//! churn. Cron-driven re-runs on unchanged photo data cost nothing.

pub mod assemble;
pub mod config;
pub mod diff;
pub mod events;
pub mod geo;
pub mod keywords;
pub mod navigation;
pub mod output;
pub mod paths;
pub mod photos;
pub mod pipeline;
pub mod queue;
pub mod snapshot;
pub mod tree;
pub mod types;
