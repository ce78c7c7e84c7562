//! Result aggregation
//!
//! This module merges the per-worker word-frequency mappings into a single
//! combined mapping. The merge is additive, associative, and commutative, so
//! partial results can be folded in any arrival order and always produce the
//! same final mapping.
//!
//! # Example
//!
//! ```
//! use wordfleet::aggregate::{CombinedResult, PartialResult};
//!
//! let mut partial = PartialResult::new();
//! partial.insert("hello".to_string(), 2);
//! partial.insert("world".to_string(), 1);
//!
//! let mut combined = CombinedResult::new();
//! combined.merge(&partial);
//! combined.merge(&partial);
//!
//! assert_eq!(combined.count("hello"), 4);
//! assert_eq!(combined.count("world"), 2);
//! ```

use std::collections::HashMap;

/// One worker's word-frequency mapping for its single assigned document.
pub type PartialResult = HashMap<String, u64>;

/// Additive merge of all partial results across all workers.
///
/// Created empty at run start and grown monotonically as results arrive.
/// For every word, the combined count is the sum of that word's count across
/// every merged partial (absent keys count as zero), so the final mapping is
/// independent of merge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedResult {
    counts: HashMap<String, u64>,
}

impl CombinedResult {
    /// Create an empty combined result
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Fold one partial result into the combined mapping
    ///
    /// Adds each word's count to the corresponding entry, creating the entry
    /// if the word has not been seen before.
    pub fn merge(&mut self, partial: &PartialResult) {
        for (word, count) in partial {
            *self.counts.entry(word.clone()).or_insert(0) += count;
        }
    }

    /// Combined count for one word (zero if never seen)
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words
    pub fn unique_words(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts across all words
    pub fn total_words(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Full mapping, keyed by word
    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    /// Entries sorted by word, for deterministic output
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
