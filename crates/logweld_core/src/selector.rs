//! Selection of segments eligible for combining.

use crate::error::{CombineResult, IoResultExt};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Segments chosen for one run, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Selected segment file names in chronological order.
    pub files: Vec<String>,
    /// Eligible segments left out because of the total cap.
    pub skipped: usize,
}

impl Selection {
    /// Returns true if nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the number of selected segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Returns true if `name` follows the segment naming convention.
///
/// Segment names start with a timestamp, so they start with a digit. This
/// excludes the sentinel and any other bookkeeping files.
#[must_use]
pub fn is_segment_name(name: &str) -> bool {
    name.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

/// Lists segment files in `dir`, sorted by name.
///
/// Directories and non-segment files are skipped.
pub fn list_segments(dir: &Path) -> CombineResult<Vec<String>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        if !entry.file_type().at(&entry.path())?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_segment_name(&name) {
            segments.push(name);
        }
    }
    segments.sort();
    Ok(segments)
}

/// Applies the retention window and total cap to a sorted segment list.
#[must_use]
pub fn apply_limits(
    mut segments: Vec<String>,
    retention_window: usize,
    total_cap: usize,
) -> Selection {
    if segments.len() <= retention_window {
        return Selection::default();
    }
    segments.truncate(segments.len() - retention_window);

    let mut skipped = 0;
    if segments.len() > total_cap {
        skipped = segments.len() - total_cap;
        info!(
            eligible = segments.len(),
            limit = total_cap,
            "eligible segments exceed the limit, ignoring remaining files"
        );
        segments.truncate(total_cap);
    }

    Selection {
        files: segments,
        skipped,
    }
}

/// Selects the segments of `dir` to combine in this run.
///
/// The newest `retention_window` segments are never selected, and at most
/// `total_cap` of the oldest remaining ones are. An empty selection means
/// there is nothing to do. Reads only.
pub fn select_segments(
    dir: &Path,
    retention_window: usize,
    total_cap: usize,
) -> CombineResult<Selection> {
    let segments = list_segments(dir)?;
    let total = segments.len();
    let selection = apply_limits(segments, retention_window, total_cap);
    debug!(
        total,
        selected = selection.len(),
        skipped = selection.skipped,
        "selected commit logs"
    );
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn names(range: std::ops::RangeInclusive<u32>) -> Vec<String> {
        range.map(|i| format!("{}", 171_000_000 + i)).collect()
    }

    #[test]
    fn naming_convention() {
        assert!(is_segment_name("1710000001"));
        assert!(is_segment_name("1710000001.condensed"));
        assert!(!is_segment_name("disabled"));
        assert!(!is_segment_name(""));
        assert!(!is_segment_name(".1710000001"));
    }

    #[test]
    fn selection_skips_dirs_and_foreign_files() {
        let temp = tempdir().unwrap();
        for name in names(1..=12) {
            fs::write(temp.path().join(name), b"entry").unwrap();
        }
        fs::write(temp.path().join("disabled"), b"").unwrap();
        fs::create_dir(temp.path().join("171999999")).unwrap();

        let selection = select_segments(temp.path(), 10, 400).unwrap();
        assert_eq!(selection.files, vec!["171000001", "171000002"]);
        assert_eq!(selection.skipped, 0);
    }

    #[test]
    fn at_or_below_window_selects_nothing() {
        assert!(apply_limits(names(1..=10), 10, 400).is_empty());
        assert!(apply_limits(Vec::new(), 0, 400).is_empty());
    }

    #[test]
    fn cap_keeps_oldest() {
        let selection = apply_limits(names(1..=20), 5, 4);
        assert_eq!(selection.files, names(1..=4));
        assert_eq!(selection.skipped, 11);
    }

    #[test]
    fn unreadable_dir_is_io_error() {
        let temp = tempdir().unwrap();
        let err = select_segments(&temp.path().join("missing"), 10, 400).unwrap_err();
        assert!(matches!(err, crate::CombineError::Io { .. }));
    }

    proptest! {
        #[test]
        fn selection_respects_window_and_cap(
            count in 0usize..60,
            window in 0usize..20,
            cap in 0usize..40,
        ) {
            let segments: Vec<String> = (0..count).map(|i| format!("{:010}", 1_700_000_000 + i)).collect();
            let selection = apply_limits(segments.clone(), window, cap);

            if count <= window {
                prop_assert!(selection.is_empty());
            } else {
                let eligible = count - window;
                prop_assert_eq!(selection.len(), eligible.min(cap));
                prop_assert_eq!(selection.skipped, eligible.saturating_sub(cap));
                prop_assert_eq!(&selection.files[..], &segments[..selection.len()]);
            }
        }
    }
}
