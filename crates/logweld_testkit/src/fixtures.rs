//! Commit-log directory fixtures.
//!
//! A [`TestLogDir`] owns a temporary base directory with a live commit-log
//! directory laid out the way `logweld_core` expects.

use logweld_core::{sentinel, CombineConfig, LogLayout};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// First segment name produced by the fixtures.
pub const FIRST_SEGMENT: u64 = 171_000_001;

/// Returns the name of the `index`-th segment (0-based).
#[must_use]
pub fn segment_name(index: usize) -> String {
    (FIRST_SEGMENT + index as u64).to_string()
}

/// Returns deterministic contents for the `index`-th segment.
#[must_use]
pub fn segment_contents(index: usize) -> Vec<u8> {
    let len = 32 + (index % 7) * 16;
    (0..len).map(|i| (i * 31 + index) as u8).collect()
}

/// A temporary base directory holding a live commit log.
pub struct TestLogDir {
    config: CombineConfig,
    _temp_dir: TempDir,
}

impl TestLogDir {
    /// Creates an empty live commit-log directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = CombineConfig::new(temp_dir.path()).with_grace_period(Duration::ZERO);
        fs::create_dir_all(config.layout().live_dir()).expect("Failed to create live directory");
        Self {
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Creates a live directory with `count` segments.
    pub fn with_segments(count: usize) -> Self {
        let dir = Self::new();
        for index in 0..count {
            dir.write_segment(&segment_name(index), &segment_contents(index));
        }
        dir
    }

    /// Returns a run configuration for this directory with no grace period.
    #[must_use]
    pub fn config(&self) -> CombineConfig {
        self.config.clone()
    }

    /// Returns the directory layout.
    #[must_use]
    pub fn layout(&self) -> LogLayout {
        self.config.layout()
    }

    /// Returns the base storage path.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.config.base_path
    }

    /// Returns the live commit-log directory.
    #[must_use]
    pub fn live_dir(&self) -> PathBuf {
        self.layout().live_dir()
    }

    /// Writes a file into the live directory.
    pub fn write_segment(&self, name: &str, data: &[u8]) {
        fs::write(self.live_dir().join(name), data).expect("Failed to write segment");
    }

    /// Returns the sorted names of all regular files in the live directory,
    /// sentinel excluded.
    #[must_use]
    pub fn segment_names(&self) -> Vec<String> {
        self.snapshot().into_keys().collect()
    }

    /// Returns the contents of every regular file in the live directory,
    /// sentinel excluded.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        read_files(&self.live_dir())
            .into_iter()
            .filter(|(name, _)| name != sentinel::SENTINEL_FILE)
            .collect()
    }

    /// Returns true if the sentinel is present.
    #[must_use]
    pub fn sentinel_present(&self) -> bool {
        sentinel::is_present(&self.live_dir())
    }

    /// Returns the backup directories created so far.
    #[must_use]
    pub fn backups(&self) -> Vec<PathBuf> {
        self.layout().list_backups().expect("Failed to list backups")
    }
}

impl Default for TestLogDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads every regular file in `dir` into a name-ordered map.
#[must_use]
pub fn read_files(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read directory entry"))
        .filter(|entry| entry.path().is_file())
        .map(|entry| {
            let name = entry.file_name().into_string().expect("Non-UTF-8 file name");
            let data = fs::read(entry.path()).expect("Failed to read file");
            (name, data)
        })
        .collect()
}
