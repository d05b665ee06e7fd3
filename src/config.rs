//! Sync configuration module.
//!
//! Handles loading and validating the `gallery-sync.toml` config file.
//! Configuration is sparse: stock defaults apply and a user file only needs
//! the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! snapshot_path = "gallery-index.json"  # Where the published snapshot lives
//! queue_dir = "queue"                   # Directory for pending upload files
//!
//! [keywords]
//! max_photos_per_keyword = 1000  # Keywords above this are not synthesized
//!
//! [sync]
//! quota = 100          # Max deliveries per run (omit sync.quota for unlimited)
//! retry_attempts = 5   # Delivery attempts per item before it stays queued
//! # spool_dir = "out"  # Spool envelopes to disk instead of dry-run logging
//!
//! [processing]
//! max_processes = 4    # Max parallel ingest workers (omit for auto = CPU cores)
//!
//! # Extra event descriptors, matched against dated folder names in order,
//! # after the built-in holidays.
//! [[events]]
//! name = "company-offsite"
//! pattern = '^\d{4}-\d{2}-\d{2}.*offsite'
//! description = "Annual company offsite"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::events::{EventDesc, EventError, EventRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Sync configuration loaded from `gallery-sync.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Path of the locally stored site index snapshot.
    pub snapshot_path: String,
    /// Directory holding pending upload queue files.
    pub queue_dir: String,
    /// Keyword synthesis settings.
    pub keywords: KeywordsConfig,
    /// Delivery settings (quota, retries, spool).
    pub sync: DeliveryConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Extra event descriptors, tried after the built-in ones.
    pub events: Vec<EventConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "gallery-index.json".to_string(),
            queue_dir: "queue".to_string(),
            keywords: KeywordsConfig::default(),
            sync: DeliveryConfig::default(),
            processing: ProcessingConfig::default(),
            events: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "sync.retry_attempts must be at least 1".into(),
            ));
        }
        if self.keywords.max_photos_per_keyword == 0 {
            return Err(ConfigError::Validation(
                "keywords.max_photos_per_keyword must be non-zero".into(),
            ));
        }
        if self.snapshot_path.is_empty() {
            return Err(ConfigError::Validation(
                "snapshot_path must not be empty".into(),
            ));
        }
        if self.queue_dir.is_empty() {
            return Err(ConfigError::Validation("queue_dir must not be empty".into()));
        }
        Ok(())
    }

    /// Build the event registry: built-in holiday descriptors first, then
    /// user-configured ones. Earlier descriptors win on multiple matches.
    pub fn event_registry(&self) -> Result<EventRegistry, ConfigError> {
        let mut registry = EventRegistry::builtin();
        for event in &self.events {
            registry.push(EventDesc::new(
                &event.name,
                &event.pattern,
                event.description.as_deref().unwrap_or_default(),
            )?);
        }
        Ok(registry)
    }
}

/// Keyword synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeywordsConfig {
    /// Keywords tagged on more photos than this are skipped entirely.
    pub max_photos_per_keyword: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            max_photos_per_keyword: 1000,
        }
    }
}

/// Delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Maximum items delivered per run. `None` means unlimited.
    pub quota: Option<usize>,
    /// Delivery attempts per item before it is left queued.
    pub retry_attempts: u32,
    /// When set, envelopes are spooled to this directory instead of being
    /// dry-run logged.
    pub spool_dir: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            quota: Some(100),
            retry_attempts: 5,
            spool_dir: None,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel ingest workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A user-configured event descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventConfig {
    /// URL-safe event name, e.g. `"company-offsite"`.
    pub name: String,
    /// Regular expression matched against dated album folder fragments.
    pub pattern: String,
    /// Optional description shown on the event's root item.
    pub description: Option<String>,
}

// =============================================================================
// Config loading and validation
// =============================================================================

/// Load config from the given file path.
///
/// A missing file yields the stock defaults. An existing file is parsed
/// strictly (unknown keys rejected) and validated.
pub fn load_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        let config = SyncConfig::default();
        config.validate()?;
        return Ok(config);
    }
    let content = fs::read_to_string(path)?;
    let config: SyncConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `gallery-sync.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Sync Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Path of the locally stored site index snapshot. The previous snapshot is
# rotated to a dated backup before each new one is written.
snapshot_path = "gallery-index.json"

# Directory for pending upload queue files. One JSON file per changed path;
# files survive restarts and are drained within the quota on each run.
queue_dir = "queue"

# ---------------------------------------------------------------------------
# Keyword hierarchy
# ---------------------------------------------------------------------------
[keywords]
# Keywords tagged on more photos than this are not synthesized at all
# (ubiquitous tags like a camera model would otherwise swamp the tree).
max_photos_per_keyword = 1000

# ---------------------------------------------------------------------------
# Delivery
# ---------------------------------------------------------------------------
[sync]
# Maximum items delivered per run; the rest stay queued for the next run.
# Comment out for unlimited.
quota = 100

# Delivery attempts per item before it is left queued.
retry_attempts = 5

# Spool envelopes to numbered JSON files in this directory instead of
# dry-run logging. Omit to log only.
# spool_dir = "out"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel ingest workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Events
# ---------------------------------------------------------------------------
# Extra event descriptors, matched against dated album folder names after
# the built-in holidays (christmas, thanksgiving, halloween, easter,
# new-years). The first matching descriptor wins.
#
# [[events]]
# name = "company-offsite"
# pattern = '^\d{4}-\d{2}-\d{2}.*offsite'
# description = "Annual company offsite"
"##
}
