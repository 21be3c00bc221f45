//! The combine run: validate, lock, select, stage, consolidate, finalize.

use crate::compactor::CompactorFactory;
use crate::config::CombineConfig;
use crate::dir::{ensure_clean_working_dir, validate_log_dir};
use crate::driver::{ConsolidationDriver, DriverStats};
use crate::error::{CombineResult, IoResultExt};
use crate::finalizer::finalize;
use crate::selector::{select_segments, Selection};
use crate::sentinel::SentinelLock;
use crate::staging::copy_segments;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Segments were combined and promoted.
    Combined,
    /// No segment was eligible.
    NothingToDo,
    /// Selection only; nothing was touched.
    DryRun,
}

/// Summary of a combine run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// How the run ended.
    pub status: RunStatus,
    /// The live commit-log directory.
    pub live_dir: PathBuf,
    /// Segments selected for combining.
    pub selection: Selection,
    /// Bytes copied into the working directory.
    pub bytes_staged: u64,
    /// Backup directory holding the originals.
    pub backup_dir: Option<PathBuf>,
    /// Compactor counters.
    pub driver: DriverStats,
    /// Segments written back into the live directory.
    pub written: Vec<String>,
}

impl RunReport {
    fn new(status: RunStatus, live_dir: PathBuf, selection: Selection) -> Self {
        Self {
            status,
            live_dir,
            selection,
            bytes_staged: 0,
            backup_dir: None,
            driver: DriverStats::default(),
            written: Vec::new(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Combines the old segments of the configured commit log.
///
/// Every step is fail-fast. Validation errors happen before any mutation;
/// staging errors happen before the originals are deleted; compactor errors
/// happen before finalization. On any error after the sentinel was created
/// the sentinel stays in place and the backup directory holds the originals.
pub fn combine_commit_logs<F: CompactorFactory>(
    config: &CombineConfig,
    factory: &F,
) -> CombineResult<RunReport> {
    let layout = config.layout();
    let live_dir = layout.live_dir();
    let working_dir = layout.working_dir();

    info!(path = %layout.base().display(), "running commit log combiner");
    info!(path = %live_dir.display(), "commit log directory");

    validate_log_dir(&live_dir, &layout.live_dir_name())?;

    if config.dry_run {
        let selection = select_segments(&live_dir, config.retention_window, config.total_cap)?;
        for file in &selection.files {
            info!(file = %file, "would combine commit log");
        }
        return Ok(RunReport::new(RunStatus::DryRun, live_dir, selection));
    }

    ensure_clean_working_dir(&working_dir)?;

    let lock = SentinelLock::acquire(&live_dir)?;

    if !config.grace_period.is_zero() {
        info!(
            seconds = config.grace_period.as_secs(),
            "waiting in case something is still in progress"
        );
        std::thread::sleep(config.grace_period);
    }

    let selection = select_segments(&live_dir, config.retention_window, config.total_cap)?;
    if selection.is_empty() {
        info!("no commit logs eligible for combining");
        lock.release()?;
        return Ok(RunReport::new(RunStatus::NothingToDo, live_dir, selection));
    }

    let backup_dir = layout.backup_dir(unix_now());
    fs::create_dir_all(&working_dir).at(&working_dir)?;
    fs::create_dir(&backup_dir).at(&backup_dir)?;

    info!(path = %working_dir.display(), "start copying into working path");
    let bytes_staged = copy_segments(&selection.files, &live_dir, &working_dir)?;

    info!(path = %backup_dir.display(), "start copying into backup path");
    copy_segments(&selection.files, &live_dir, &backup_dir)?;

    let compactor = factory.open(&working_dir, config.thresholds())?;
    let driver = ConsolidationDriver::new(compactor).finish()?;

    let outcome = finalize(&selection.files, &live_dir, &working_dir, lock)?;
    info!(
        removed = outcome.removed,
        written = outcome.written.len(),
        bytes = outcome.bytes_written,
        "commit logs combined"
    );

    Ok(RunReport {
        status: RunStatus::Combined,
        live_dir,
        selection,
        bytes_staged,
        backup_dir: Some(backup_dir),
        driver,
        written: outcome.written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compactor::{MockCall, MockCompactor};
    use crate::sentinel;
    use crate::CombineError;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn setup(base: &Path, count: u32) -> PathBuf {
        let live = base.join("main.hnsw.commitlog.d");
        fs::create_dir(&live).unwrap();
        for i in 1..=count {
            fs::write(live.join(format!("{}", 171_000_000 + i)), [i as u8; 16]).unwrap();
        }
        live
    }

    fn config(base: &Path) -> CombineConfig {
        CombineConfig::new(base).with_grace_period(Duration::ZERO)
    }

    #[test]
    fn nothing_eligible_releases_sentinel() {
        let base = tempdir().unwrap();
        let live = setup(base.path(), 10);
        let mock = MockCompactor::new();

        let report = combine_commit_logs(&config(base.path()), &mock).unwrap();

        assert_eq!(report.status, RunStatus::NothingToDo);
        assert!(mock.calls().is_empty());
        assert!(!sentinel::is_present(&live));
        assert!(!base.path().join("working.hnsw.commitlog.d").exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let base = tempdir().unwrap();
        let live = setup(base.path(), 12);
        let mock = MockCompactor::new();

        let report = combine_commit_logs(&config(base.path()).with_dry_run(true), &mock).unwrap();

        assert_eq!(report.status, RunStatus::DryRun);
        assert_eq!(report.selection.files, vec!["171000001", "171000002"]);
        assert!(mock.calls().is_empty());
        assert!(!sentinel::is_present(&live));
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 1);
    }

    #[test]
    fn engine_failure_keeps_sentinel_and_originals() {
        let base = tempdir().unwrap();
        let live = setup(base.path(), 12);
        let mock = MockCompactor::new().fail_on(MockCall::Combine);

        let err = combine_commit_logs(&config(base.path()), &mock).unwrap_err();

        assert!(err.is_engine());
        assert!(sentinel::is_present(&live));
        assert!(live.join("171000001").exists());
        assert!(base.path().join("working.hnsw.commitlog.d").exists());
    }

    #[test]
    fn dirty_working_dir_is_refused_before_locking() {
        let base = tempdir().unwrap();
        let live = setup(base.path(), 12);
        let working = base.path().join("working.hnsw.commitlog.d");
        fs::create_dir(&working).unwrap();
        fs::write(working.join("171000001"), b"leftover").unwrap();

        let err = combine_commit_logs(&config(base.path()), &MockCompactor::new()).unwrap_err();

        assert!(matches!(err, CombineError::WorkingDirNotEmpty { .. }));
        assert!(!sentinel::is_present(&live));
    }

    #[test]
    fn compactor_sees_working_dir_and_thresholds() {
        let base = tempdir().unwrap();
        setup(base.path(), 11);
        let mock = MockCompactor::new();
        let config = config(base.path()).with_target_size(500);

        combine_commit_logs(&config, &mock).unwrap();

        assert_eq!(
            mock.calls()[0],
            MockCall::Open(
                base.path().join("working.hnsw.commitlog.d"),
                config.thresholds()
            )
        );
    }
}
