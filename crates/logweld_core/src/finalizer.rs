//! Promoting combined segments into the live directory.

use crate::dir::sync_dir;
use crate::error::{CombineResult, IoResultExt};
use crate::sentinel::SentinelLock;
use crate::staging::{copy_segments, list_files};
use std::fs;
use std::path::Path;
use tracing::info;

/// What the finalizer did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalizeOutcome {
    /// Segments removed from the live directory.
    pub removed: usize,
    /// Segments copied back from the working directory.
    pub written: Vec<String>,
    /// Bytes copied back.
    pub bytes_written: u64,
}

/// Replaces the selected segments in `live_dir` with the contents of
/// `working_dir` and releases the sentinel.
///
/// Runs only after the compactor has been shut down. The order is fixed:
/// remove originals, copy combined segments back, remove the working
/// directory, release the sentinel. Any failure stops the sequence and
/// leaves the sentinel in place; the backup directory holds the originals.
pub fn finalize<S: AsRef<str>>(
    selected: &[S],
    live_dir: &Path,
    working_dir: &Path,
    lock: SentinelLock,
) -> CombineResult<FinalizeOutcome> {
    let mut outcome = FinalizeOutcome::default();

    for file in selected {
        let file = file.as_ref();
        let path = live_dir.join(file);
        fs::remove_file(&path).at(&path)?;
        info!(file, "removed commit log");
        outcome.removed += 1;
    }

    let combined = list_files(working_dir)?;
    outcome.bytes_written = copy_segments(&combined, working_dir, live_dir)?;
    outcome.written = combined;
    sync_dir(live_dir)?;

    fs::remove_dir_all(working_dir).at(working_dir)?;
    info!(path = %working_dir.display(), "removed working folder");

    lock.release()?;
    Ok(outcome)
}
