//! Advisory sentinel marking a commit-log directory as under maintenance.
//!
//! The owning engine checks for `<dir>/disabled` before starting its own
//! background compaction. Nothing enforces this: the marker is a cooperative
//! signal, not a lock the filesystem honors.

use crate::dir::ensure_dir;
use crate::error::{CombineError, CombineResult};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the sentinel inside the commit-log directory.
pub const SENTINEL_FILE: &str = "disabled";

/// Returns the sentinel path for a commit-log directory.
#[must_use]
pub fn sentinel_path(dir: &Path) -> PathBuf {
    dir.join(SENTINEL_FILE)
}

/// Returns true if the sentinel is present in `dir`.
#[must_use]
pub fn is_present(dir: &Path) -> bool {
    sentinel_path(dir).is_file()
}

/// A held sentinel.
///
/// Dropping the value does not remove the marker. After a failed run the
/// sentinel must stay in place so operators can see that the directory needs
/// recovery; only [`SentinelLock::release`] removes it.
#[derive(Debug)]
#[must_use = "the sentinel stays on disk until released"]
pub struct SentinelLock {
    dir: PathBuf,
}

impl SentinelLock {
    /// Creates the sentinel in `dir`.
    ///
    /// # Errors
    ///
    /// `NotFound` or `NotADirectory` if `dir` is unusable, `Io` if the marker
    /// cannot be created.
    pub fn acquire(dir: &Path) -> CombineResult<Self> {
        ensure_dir(dir)?;

        let path = sentinel_path(dir);
        File::create(&path).map_err(|e| CombineError::io(&path, e))?;
        info!(path = %path.display(), "created disabled sentinel file");

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the directory this sentinel guards.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes the sentinel.
    pub fn release(self) -> CombineResult<()> {
        release(&self.dir)
    }
}

/// Removes the sentinel from `dir`.
///
/// A missing sentinel is logged and tolerated, so releasing twice is not an
/// error.
pub fn release(dir: &Path) -> CombineResult<()> {
    ensure_dir(dir)?;

    let path = sentinel_path(dir);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            info!(path = %path.display(), "removed disabled sentinel file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "disabled sentinel file does not exist");
            Ok(())
        }
        Err(e) => Err(CombineError::io(&path, e)),
    }
}
