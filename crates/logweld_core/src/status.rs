//! Read-only status of a commit log.

use crate::config::CombineConfig;
use crate::dir::validate_log_dir;
use crate::error::CombineResult;
use crate::selector::{apply_limits, list_segments};
use crate::sentinel;
use serde::Serialize;
use std::path::PathBuf;

/// Snapshot of a commit log and its maintenance state.
#[derive(Debug, Clone, Serialize)]
pub struct LogStatus {
    /// The live commit-log directory.
    pub live_dir: PathBuf,
    /// Whether the sentinel is present.
    pub sentinel_present: bool,
    /// Number of segments in the live directory.
    pub segments: usize,
    /// Number of segments the next run would select.
    pub eligible: usize,
    /// Whether a working directory exists.
    pub working_dir_present: bool,
    /// Existing backup directories, oldest first.
    pub backups: Vec<PathBuf>,
}

impl LogStatus {
    /// Returns true if a previous run appears to have aborted.
    #[must_use]
    pub fn needs_recovery(&self) -> bool {
        self.sentinel_present || self.working_dir_present
    }
}

/// Inspects the commit log described by `config` without modifying it.
pub fn inspect(config: &CombineConfig) -> CombineResult<LogStatus> {
    let layout = config.layout();
    let live_dir = layout.live_dir();
    validate_log_dir(&live_dir, &layout.live_dir_name())?;

    let segments = list_segments(&live_dir)?;
    let count = segments.len();
    let eligible = apply_limits(segments, config.retention_window, config.total_cap).len();

    Ok(LogStatus {
        sentinel_present: sentinel::is_present(&live_dir),
        segments: count,
        eligible,
        working_dir_present: layout.working_dir().exists(),
        backups: layout.list_backups()?,
        live_dir,
    })
}
