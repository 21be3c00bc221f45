//! Run configuration.

use crate::dir::LogLayout;
use std::path::PathBuf;
use std::time::Duration;

/// Default name of the log stream.
pub const DEFAULT_LOG_NAME: &str = "main";

/// Default suffix of commit-log directories.
pub const DEFAULT_LOG_SUFFIX: &str = "hnsw.commitlog.d";

/// Default target output size for combined segments (24 000 MiB).
pub const DEFAULT_TARGET_SIZE: u64 = 1024 * 1024 * 24_000;

/// Default number of newest segments that are never touched.
pub const DEFAULT_RETENTION_WINDOW: usize = 10;

/// Default maximum number of segments combined in one run.
pub const DEFAULT_TOTAL_CAP: usize = 400;

/// Default wait after acquiring the sentinel.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(120);

/// The condense threshold is the target size divided by this.
const CONDENSE_DIVISOR: u64 = 5;

/// Size thresholds handed to the compactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Maximum size of a segment produced by combining.
    pub combine: u64,
    /// Size governing condensation of older segments.
    pub condense: u64,
}

impl Thresholds {
    /// Derives both thresholds from the target output size.
    #[must_use]
    pub fn from_target(target: u64) -> Self {
        Self {
            combine: target,
            condense: target / CONDENSE_DIVISOR,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_target(DEFAULT_TARGET_SIZE)
    }
}

/// Configuration for one combine run.
///
/// Built once per invocation and passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Base storage path holding the commit-log directories.
    pub base_path: PathBuf,
    /// Name of the log stream (`main`).
    pub log_name: String,
    /// Commit-log directory suffix (`hnsw.commitlog.d`).
    pub log_suffix: String,
    /// Number of newest segments that are never selected.
    pub retention_window: usize,
    /// Maximum number of segments selected in one run.
    pub total_cap: usize,
    /// Target output size of combined segments.
    pub target_size: u64,
    /// Wait between acquiring the sentinel and touching any segment.
    pub grace_period: Duration,
    /// Select and report only, without touching the filesystem.
    pub dry_run: bool,
}

impl CombineConfig {
    /// Creates a configuration with defaults for the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            log_name: DEFAULT_LOG_NAME.to_string(),
            log_suffix: DEFAULT_LOG_SUFFIX.to_string(),
            retention_window: DEFAULT_RETENTION_WINDOW,
            total_cap: DEFAULT_TOTAL_CAP,
            target_size: DEFAULT_TARGET_SIZE,
            grace_period: DEFAULT_GRACE_PERIOD,
            dry_run: false,
        }
    }

    /// Sets the log stream name.
    pub fn with_log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = name.into();
        self
    }

    /// Sets the commit-log directory suffix.
    pub fn with_log_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.log_suffix = suffix.into();
        self
    }

    /// Sets how many of the newest segments are left alone.
    pub fn with_retention_window(mut self, window: usize) -> Self {
        self.retention_window = window;
        self
    }

    /// Sets the maximum number of segments per run.
    pub fn with_total_cap(mut self, cap: usize) -> Self {
        self.total_cap = cap;
        self
    }

    /// Sets the target output size.
    pub fn with_target_size(mut self, bytes: u64) -> Self {
        self.target_size = bytes;
        self
    }

    /// Sets the grace period after acquiring the sentinel.
    pub fn with_grace_period(mut self, period: Duration) -> Self {
        self.grace_period = period;
        self
    }

    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the thresholds for the compactor.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::from_target(self.target_size)
    }

    /// Returns the directory layout under the base path.
    #[must_use]
    pub fn layout(&self) -> LogLayout {
        LogLayout::new(&self.base_path, &self.log_name, &self.log_suffix)
    }
}
