//! Format-agnostic compactor that concatenates neighbouring segments.
//!
//! Segments are append-only logs, so replaying `a` followed by `b` is the
//! same as replaying `a ++ b`. Combining appends a segment onto its
//! predecessor, and the predecessor's name is kept so ordering survives.

use super::{CompactorFactory, LogCompactor};
use crate::config::Thresholds;
use crate::dir::{ensure_dir, sync_dir};
use crate::error::{CombineError, CombineResult};
use crate::selector::list_segments;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, Span};

const OP_COMBINE: &str = "combine logs";
const OP_CONDENSE: &str = "condense old logs";
const OP_FLUSH: &str = "flush";
const OP_SHUTDOWN: &str = "shut down";

/// Compactor concatenating adjacent segments up to the combine threshold.
///
/// Condensing drops zero-length segments, which carry no entries.
#[derive(Debug)]
pub struct ConcatCompactor {
    dir: PathBuf,
    thresholds: Thresholds,
    closed: bool,
    span: Span,
}

impl ConcatCompactor {
    /// Opens a compactor over `dir`.
    pub fn open(dir: &Path, thresholds: Thresholds) -> CombineResult<Self> {
        ensure_dir(dir)?;
        let span = info_span!("compactor", dir = %dir.display());
        span.in_scope(|| {
            info!(
                combine_threshold = thresholds.combine,
                condense_threshold = thresholds.condense,
                "opened commit log compactor"
            );
        });
        Ok(Self {
            dir: dir.to_path_buf(),
            thresholds,
            closed: false,
            span,
        })
    }

    /// Returns the thresholds in use.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    fn check_open(&self, operation: &'static str) -> CombineResult<()> {
        if self.closed {
            return Err(CombineError::engine(operation, "compactor is shut down"));
        }
        Ok(())
    }

    fn segment_sizes(&self, operation: &'static str) -> CombineResult<Vec<(String, u64)>> {
        let names = list_segments(&self.dir)
            .map_err(|e| CombineError::engine(operation, e.to_string()))?;
        names
            .into_iter()
            .map(|name| {
                let path = self.dir.join(&name);
                let len = fs::metadata(&path)
                    .map_err(|e| engine_io(operation, &path, e))?
                    .len();
                Ok((name, len))
            })
            .collect()
    }

    fn append(&self, target: &str, source: &str) -> CombineResult<()> {
        let target_path = self.dir.join(target);
        let source_path = self.dir.join(source);

        let mut reader =
            File::open(&source_path).map_err(|e| engine_io(OP_COMBINE, &source_path, e))?;
        let mut writer = OpenOptions::new()
            .append(true)
            .open(&target_path)
            .map_err(|e| engine_io(OP_COMBINE, &target_path, e))?;
        io::copy(&mut reader, &mut writer).map_err(|e| engine_io(OP_COMBINE, &target_path, e))?;
        writer
            .sync_all()
            .map_err(|e| engine_io(OP_COMBINE, &target_path, e))?;
        drop(reader);

        fs::remove_file(&source_path).map_err(|e| engine_io(OP_COMBINE, &source_path, e))
    }
}

fn engine_io(operation: &'static str, path: &Path, err: io::Error) -> CombineError {
    CombineError::engine(operation, format!("{}: {err}", path.display()))
}

impl LogCompactor for ConcatCompactor {
    fn combine_logs(&mut self) -> CombineResult<bool> {
        self.check_open(OP_COMBINE)?;
        let _guard = self.span.enter();

        let segments = self.segment_sizes(OP_COMBINE)?;
        let candidate = segments.windows(2).find(|pair| {
            let (_, a) = &pair[0];
            let (_, b) = &pair[1];
            *a > 0 && *b > 0 && a.saturating_add(*b) <= self.thresholds.combine
        });

        let Some(pair) = candidate else {
            return Ok(false);
        };
        let (target, source) = (&pair[0].0, &pair[1].0);
        self.append(target, source)?;
        debug!(target = %target, source = %source, "combined commit logs");
        Ok(true)
    }

    fn condense_old_logs(&mut self) -> CombineResult<bool> {
        self.check_open(OP_CONDENSE)?;
        let _guard = self.span.enter();

        let segments = self.segment_sizes(OP_CONDENSE)?;
        let Some((name, _)) = segments.iter().find(|(_, len)| *len == 0) else {
            return Ok(false);
        };
        let path = self.dir.join(name);
        fs::remove_file(&path).map_err(|e| engine_io(OP_CONDENSE, &path, e))?;
        debug!(file = %name, "dropped empty commit log");
        Ok(true)
    }

    fn flush(&mut self) -> CombineResult<()> {
        self.check_open(OP_FLUSH)?;
        sync_dir(&self.dir).map_err(|e| CombineError::engine(OP_FLUSH, e.to_string()))
    }

    fn shutdown(&mut self) -> CombineResult<()> {
        self.check_open(OP_SHUTDOWN)?;
        self.closed = true;
        self.span.in_scope(|| info!("shut down commit log compactor"));
        Ok(())
    }
}

/// Opens [`ConcatCompactor`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatCompactorFactory;

impl CompactorFactory for ConcatCompactorFactory {
    type Compactor = ConcatCompactor;

    fn open(&self, dir: &Path, thresholds: Thresholds) -> CombineResult<Self::Compactor> {
        ConcatCompactor::open(dir, thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, data: &[u8]) {
        fs::write(dir.join(name), data).unwrap();
    }

    #[test]
    fn combines_until_threshold() {
        let temp = tempdir().unwrap();
        write(temp.path(), "1710000001", b"aaaa");
        write(temp.path(), "1710000002", b"bbbb");
        write(temp.path(), "1710000003", b"cccc");

        let mut compactor = ConcatCompactor::open(temp.path(), Thresholds::from_target(8)).unwrap();
        assert!(compactor.combine_logs().unwrap());
        assert!(!compactor.combine_logs().unwrap());

        assert_eq!(fs::read(temp.path().join("1710000001")).unwrap(), b"aaaabbbb");
        assert!(!temp.path().join("1710000002").exists());
        assert_eq!(fs::read(temp.path().join("1710000003")).unwrap(), b"cccc");
    }

    #[test]
    fn condense_drops_empty_segments() {
        let temp = tempdir().unwrap();
        write(temp.path(), "1710000001", b"");
        write(temp.path(), "1710000002", b"data");

        let mut compactor =
            ConcatCompactor::open(temp.path(), Thresholds::from_target(1024)).unwrap();
        assert!(compactor.condense_old_logs().unwrap());
        assert!(!compactor.condense_old_logs().unwrap());
        assert!(!temp.path().join("1710000001").exists());
    }

    #[test]
    fn calls_after_shutdown_fail() {
        let temp = tempdir().unwrap();
        let mut compactor =
            ConcatCompactor::open(temp.path(), Thresholds::from_target(1024)).unwrap();
        compactor.flush().unwrap();
        compactor.shutdown().unwrap();

        assert!(compactor.combine_logs().unwrap_err().is_engine());
        assert!(compactor.shutdown().unwrap_err().is_engine());
    }
}
