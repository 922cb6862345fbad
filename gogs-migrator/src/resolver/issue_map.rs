//! Old issue index to new issue number mapping.

use std::collections::BTreeMap;
use tracing::debug;

/// Maps Gogs issue indices to GitHub issue numbers.
///
/// `None` marks an item that was processed but not migrated. Entries are
/// write-once: the first recorded value for an index is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueMap {
    entries: BTreeMap<i64, Option<u64>>,
}

impl IssueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `index` and returns the stored value.
    ///
    /// A second record for the same index is ignored.
    pub fn record(&mut self, index: i64, number: Option<u64>) -> Option<u64> {
        if let Some(existing) = self.entries.get(&index) {
            debug!(index, ?existing, ignored = ?number, "Issue index already mapped");
            return *existing;
        }
        self.entries.insert(index, number);
        number
    }

    /// Mapping for `index`: `None` if unknown, `Some(None)` if not migrated.
    #[must_use]
    pub fn get(&self, index: i64) -> Option<Option<u64>> {
        self.entries.get(&index).copied()
    }

    /// New number of a migrated item.
    #[must_use]
    pub fn migrated(&self, index: i64) -> Option<u64> {
        self.get(index).flatten()
    }

    #[must_use]
    pub fn contains(&self, index: i64) -> bool {
        self.entries.contains_key(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
