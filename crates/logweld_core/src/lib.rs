//! # logweld core
//!
//! Crash-safe combining of commit-log segments.
//!
//! A storage engine that appends to many small commit-log segments starts
//! slowly, because every segment has to be replayed. This crate folds the
//! older segments of a live commit-log directory into fewer, larger ones
//! while the engine keeps running:
//!
//! 1. validate the commit-log directory
//! 2. create the `disabled` sentinel so the engine pauses its own compaction
//! 3. select the old segments, leaving the newest ones alone
//! 4. copy them into a working directory and into a timestamped backup
//! 5. drive a [`LogCompactor`] over the working directory to a fixed point
//! 6. swap the originals for the combined segments and release the sentinel
//!
//! ## Key Invariants
//!
//! - Nothing destructive happens before the backup copy exists
//! - The newest `retention_window` segments are never touched
//! - The sentinel is only removed after the live directory is fully updated
//! - Any failure stops the run and leaves the sentinel in place
//!
//! The sentinel is advisory: it only works if the engine checks for it.
//!
//! ## Example
//!
//! ```no_run
//! use logweld_core::{combine_commit_logs, CombineConfig, ConcatCompactorFactory};
//!
//! let config = CombineConfig::new("/var/lib/index/shard0");
//! let report = combine_commit_logs(&config, &ConcatCompactorFactory)?;
//! println!("combined {} segments", report.selection.len());
//! # Ok::<(), logweld_core::CombineError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod combiner;
pub mod compactor;
mod config;
pub mod dir;
mod driver;
mod error;
mod finalizer;
pub mod selector;
pub mod sentinel;
pub mod staging;
mod status;

pub use combiner::{combine_commit_logs, RunReport, RunStatus};
pub use compactor::{
    CompactorFactory, ConcatCompactor, ConcatCompactorFactory, LogCompactor, MockCall,
    MockCompactor,
};
pub use config::{
    CombineConfig, Thresholds, DEFAULT_GRACE_PERIOD, DEFAULT_LOG_NAME, DEFAULT_LOG_SUFFIX,
    DEFAULT_RETENTION_WINDOW, DEFAULT_TARGET_SIZE, DEFAULT_TOTAL_CAP,
};
pub use dir::{validate_log_dir, LogLayout};
pub use driver::{ConsolidationDriver, DriverPhase, DriverStats};
pub use error::{CombineError, CombineResult};
pub use finalizer::{finalize, FinalizeOutcome};
pub use selector::{select_segments, Selection};
pub use sentinel::SentinelLock;
pub use status::{inspect, LogStatus};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
