//! # logweld testkit
//!
//! Test utilities for logweld.
//!
//! This crate provides:
//! - Temporary commit-log directories populated with segments
//! - Property-based strategies for segment names and contents
//!
//! ## Usage
//!
//! ```rust
//! use logweld_testkit::prelude::*;
//!
//! let log = TestLogDir::with_segments(12);
//! assert_eq!(log.segment_names().len(), 12);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
