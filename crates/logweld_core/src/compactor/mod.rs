//! Compactor abstraction.
//!
//! The byte-level merge of segment contents belongs to the storage engine.
//! The combiner only needs the four primitives of [`LogCompactor`], which
//! lets different engines, and test doubles, plug in.

mod concat;

pub use concat::{ConcatCompactor, ConcatCompactorFactory};

use crate::config::Thresholds;
use crate::error::{CombineError, CombineResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A handle on the engine's log-compaction capability, bound to one
/// directory.
pub trait LogCompactor {
    /// Merges eligible segments. Returns true if anything changed.
    fn combine_logs(&mut self) -> CombineResult<bool>;

    /// Rewrites or shrinks older segments. Returns true if anything changed.
    fn condense_old_logs(&mut self) -> CombineResult<bool>;

    /// Flushes buffered state to disk.
    fn flush(&mut self) -> CombineResult<()>;

    /// Shuts the handle down. No other call is valid afterwards.
    fn shutdown(&mut self) -> CombineResult<()>;
}

/// Opens compactors against a directory.
pub trait CompactorFactory {
    /// The compactor type produced.
    type Compactor: LogCompactor;

    /// Opens a compactor over `dir` with the given thresholds.
    fn open(&self, dir: &Path, thresholds: Thresholds) -> CombineResult<Self::Compactor>;
}

/// A call recorded by [`MockCompactor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// The factory opened a compactor.
    Open(PathBuf, Thresholds),
    /// `combine_logs`.
    Combine,
    /// `condense_old_logs`.
    Condense,
    /// `flush`.
    Flush,
    /// `shutdown`.
    Shutdown,
}

/// A scripted compactor for testing.
///
/// Reports progress for a fixed number of calls to each primitive and no
/// progress afterwards. It never touches the filesystem. Clones share the
/// call log, so a test can keep one clone for inspection.
#[derive(Debug, Clone, Default)]
pub struct MockCompactor {
    combine_progress: usize,
    condense_progress: usize,
    fail_on: Option<MockCall>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockCompactor {
    /// Creates a compactor that never reports progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports progress on the first `calls` calls to `combine_logs`.
    pub fn with_combine_progress(mut self, calls: usize) -> Self {
        self.combine_progress = calls;
        self
    }

    /// Reports progress on the first `calls` calls to `condense_old_logs`.
    pub fn with_condense_progress(mut self, calls: usize) -> Self {
        self.condense_progress = calls;
        self
    }

    /// Fails the first call of the given kind.
    pub fn fail_on(mut self, call: MockCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Returns how many times `call` was recorded.
    pub fn count(&self, call: &MockCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn record(&mut self, call: MockCall, operation: &'static str) -> CombineResult<()> {
        self.calls.lock().push(call.clone());
        if self.fail_on.as_ref() == Some(&call) {
            self.fail_on = None;
            return Err(CombineError::engine(operation, "scripted failure"));
        }
        Ok(())
    }
}

impl LogCompactor for MockCompactor {
    fn combine_logs(&mut self) -> CombineResult<bool> {
        self.record(MockCall::Combine, "combine logs")?;
        if self.combine_progress > 0 {
            self.combine_progress -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn condense_old_logs(&mut self) -> CombineResult<bool> {
        self.record(MockCall::Condense, "condense old logs")?;
        if self.condense_progress > 0 {
            self.condense_progress -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn flush(&mut self) -> CombineResult<()> {
        self.record(MockCall::Flush, "flush")
    }

    fn shutdown(&mut self) -> CombineResult<()> {
        self.record(MockCall::Shutdown, "shut down")
    }
}

impl CompactorFactory for MockCompactor {
    type Compactor = MockCompactor;

    fn open(&self, dir: &Path, thresholds: Thresholds) -> CombineResult<Self::Compactor> {
        let mut compactor = self.clone();
        compactor.record(MockCall::Open(dir.to_path_buf(), thresholds), "open")?;
        Ok(compactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_reports_scripted_progress() {
        let mut mock = MockCompactor::new().with_combine_progress(2);
        assert!(mock.combine_logs().unwrap());
        assert!(mock.combine_logs().unwrap());
        assert!(!mock.combine_logs().unwrap());
        assert!(!mock.condense_old_logs().unwrap());
        assert_eq!(mock.count(&MockCall::Combine), 3);
        assert_eq!(mock.count(&MockCall::Condense), 1);
    }

    #[test]
    fn mock_fails_once() {
        let mut mock = MockCompactor::new().fail_on(MockCall::Flush);
        assert!(mock.flush().unwrap_err().is_engine());
        mock.flush().unwrap();
    }

    #[test]
    fn clones_share_call_log() {
        let probe = MockCompactor::new();
        let mut opened = probe
            .open(Path::new("/tmp/working"), Thresholds::from_target(10))
            .unwrap();
        opened.shutdown().unwrap();
        assert_eq!(
            probe.calls(),
            vec![
                MockCall::Open(PathBuf::from("/tmp/working"), Thresholds::from_target(10)),
                MockCall::Shutdown,
            ]
        );
    }
}
