//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for a set of distinct, equal-width timestamp segment names,
/// returned sorted.
pub fn segment_names_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(1_700_000_000u64..1_799_999_999, 0..=max)
        .prop_map(|set| set.into_iter().map(|ts| ts.to_string()).collect())
}

/// Strategy for segment contents (arbitrary bytes, possibly empty).
pub fn segment_data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for file names that are not segments.
pub fn foreign_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_.]{0,15}").expect("Invalid regex")
}

/// Configuration for property tests touching the filesystem.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
}

impl PropTestConfig {
    /// Few cases, for tests that create directories.
    #[must_use]
    pub fn filesystem() -> Self {
        Self { cases: 32 }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            ..ProptestConfig::default()
        }
    }
}
