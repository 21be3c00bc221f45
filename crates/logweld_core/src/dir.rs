//! Commit-log directory layout and validation.
//!
//! A combine run touches these paths under the base storage path:
//!
//! ```text
//! <base>/
//! ├─ main.hnsw.commitlog.d/              # live segments
//! │  ├─ 1710000001
//! │  ├─ ...
//! │  └─ disabled                         # sentinel, present while a run is active
//! ├─ working.hnsw.commitlog.d/           # ephemeral, removed after a successful run
//! └─ main.hnsw.commitlog.d.<unix>.bak/   # backup of the selection, never removed
//! ```

use crate::error::{CombineError, CombineResult, IoResultExt};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the working log stream.
const WORKING_NAME: &str = "working";

/// Extension appended to backup directories.
const BACKUP_EXTENSION: &str = "bak";

/// Paths of the directories involved in a combine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    base: PathBuf,
    name: String,
    suffix: String,
}

impl LogLayout {
    /// Creates a layout for `<base>/<name>.<suffix>`.
    pub fn new(base: &Path, name: &str, suffix: &str) -> Self {
        Self {
            base: base.to_path_buf(),
            name: name.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Returns the base storage path.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the expected last component of the live directory.
    #[must_use]
    pub fn live_dir_name(&self) -> String {
        format!("{}.{}", self.name, self.suffix)
    }

    /// Returns the live commit-log directory.
    #[must_use]
    pub fn live_dir(&self) -> PathBuf {
        self.base.join(self.live_dir_name())
    }

    /// Returns the working directory.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        self.base.join(format!("{WORKING_NAME}.{}", self.suffix))
    }

    /// Returns the backup directory for a run started at `unix_secs`.
    #[must_use]
    pub fn backup_dir(&self, unix_secs: u64) -> PathBuf {
        self.base.join(format!(
            "{}.{unix_secs}.{BACKUP_EXTENSION}",
            self.live_dir_name()
        ))
    }

    /// Lists existing backup directories, oldest first.
    pub fn list_backups(&self) -> CombineResult<Vec<PathBuf>> {
        let prefix = format!("{}.", self.live_dir_name());
        let suffix = format!(".{BACKUP_EXTENSION}");

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.base).at(&self.base)? {
            let entry = entry.at(&self.base)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let is_backup = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(|ts| !ts.is_empty() && ts.bytes().all(|b| b.is_ascii_digit()));
            if is_backup && entry.path().is_dir() {
                backups.push(entry.path());
            }
        }
        backups.sort();
        Ok(backups)
    }
}

/// Checks that `path` exists and is a directory.
pub fn ensure_dir(path: &Path) -> CombineResult<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CombineError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(CombineError::io(path, e)),
    };

    if !metadata.is_dir() {
        return Err(CombineError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Validates a live commit-log directory.
///
/// Fails with `NotFound`, `NotADirectory`, or `NamingMismatch` when the
/// last path component does not end with `expected_name`. Performs no
/// mutation.
pub fn validate_log_dir(path: &Path, expected_name: &str) -> CombineResult<()> {
    ensure_dir(path)?;

    let matches = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(expected_name));
    if !matches {
        return Err(CombineError::NamingMismatch {
            path: path.to_path_buf(),
            expected: expected_name.to_string(),
        });
    }

    Ok(())
}

/// Fails if `path` exists and still contains entries.
pub fn ensure_clean_working_dir(path: &Path) -> CombineResult<()> {
    match fs::read_dir(path) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                return Err(CombineError::WorkingDirNotEmpty {
                    path: path.to_path_buf(),
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CombineError::io(path, e)),
    }
}

/// Syncs a directory so that creations, renames and deletions are durable.
#[cfg(unix)]
pub fn sync_dir(path: &Path) -> CombineResult<()> {
    let dir = fs::File::open(path).at(path)?;
    dir.sync_all().at(path)
}

/// Directory fsync is not available on this platform; the filesystem
/// journal covers metadata durability.
#[cfg(not(unix))]
pub fn sync_dir(_path: &Path) -> CombineResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_paths() {
        let layout = LogLayout::new(Path::new("/data"), "main", "hnsw.commitlog.d");
        assert_eq!(layout.live_dir(), Path::new("/data/main.hnsw.commitlog.d"));
        assert_eq!(
            layout.working_dir(),
            Path::new("/data/working.hnsw.commitlog.d")
        );
        assert_eq!(
            layout.backup_dir(1_710_000_000),
            Path::new("/data/main.hnsw.commitlog.d.1710000000.bak")
        );
    }

    #[test]
    fn validate_missing_dir() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.hnsw.commitlog.d");
        let err = validate_log_dir(&path, "main.hnsw.commitlog.d").unwrap_err();
        assert!(matches!(err, CombineError::NotFound { .. }));
    }

    #[test]
    fn validate_file_instead_of_dir() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.hnsw.commitlog.d");
        fs::write(&path, b"").unwrap();
        let err = validate_log_dir(&path, "main.hnsw.commitlog.d").unwrap_err();
        assert!(matches!(err, CombineError::NotADirectory { .. }));
    }

    #[test]
    fn validate_wrong_name() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("foo.commitlog");
        fs::create_dir(&path).unwrap();
        let err = validate_log_dir(&path, "main.hnsw.commitlog.d").unwrap_err();
        assert!(matches!(err, CombineError::NamingMismatch { .. }));
        assert!(err.is_path_invalid());
    }

    #[test]
    fn validate_accepts_expected_name() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.hnsw.commitlog.d");
        fs::create_dir(&path).unwrap();
        validate_log_dir(&path, "main.hnsw.commitlog.d").unwrap();
    }

    #[test]
    fn working_dir_guard() {
        let temp = tempdir().unwrap();
        let working = temp.path().join("working.hnsw.commitlog.d");

        ensure_clean_working_dir(&working).unwrap();

        fs::create_dir(&working).unwrap();
        ensure_clean_working_dir(&working).unwrap();

        fs::write(working.join("1710000001"), b"stale").unwrap();
        let err = ensure_clean_working_dir(&working).unwrap_err();
        assert!(matches!(err, CombineError::WorkingDirNotEmpty { .. }));
    }

    #[test]
    fn list_backups_filters_names() {
        let temp = tempdir().unwrap();
        let layout = LogLayout::new(temp.path(), "main", "hnsw.commitlog.d");
        fs::create_dir(layout.backup_dir(200)).unwrap();
        fs::create_dir(layout.backup_dir(100)).unwrap();
        fs::create_dir(temp.path().join("main.hnsw.commitlog.d.x.bak")).unwrap();
        fs::write(temp.path().join("main.hnsw.commitlog.d.300.bak"), b"").unwrap();

        let backups = layout.list_backups().unwrap();
        assert_eq!(backups, vec![layout.backup_dir(100), layout.backup_dir(200)]);
    }
}
