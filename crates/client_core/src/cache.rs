//! Client-side view of the summary collection.
//!
//! Records are keyed by id. Display order is never stored here; see [`crate::sort`].

use std::collections::BTreeMap;

use shared::domain::{Summary, SummaryId};
use tracing::{error, warn};

/// Field replacements applied by [`SummaryCache::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryPatch {
    pub original_file_name: Option<String>,
    pub summary_text: Option<String>,
}

impl SummaryPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            original_file_name: None,
            summary_text: Some(text.into()),
        }
    }

    fn apply(self, record: &mut Summary) {
        if let Some(name) = self.original_file_name {
            record.original_file_name = Some(name);
        }
        if let Some(text) = self.summary_text {
            record.summary_text = Some(text);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SummaryCache {
    records: BTreeMap<SummaryId, Summary>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, records: Vec<Summary>) {
        let incoming = records.len();
        self.records.clear();
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        if self.records.len() != incoming {
            warn!(
                incoming,
                unique = self.records.len(),
                "cache: load received duplicate summary ids; kept last occurrence"
            );
        }
    }

    /// Returns `false` when the id is already cached. Store-assigned ids make
    /// that an invariant violation, so debug builds panic on it.
    pub fn insert(&mut self, record: Summary) -> bool {
        if self.records.contains_key(&record.id) {
            debug_assert!(false, "duplicate summary id {}", record.id);
            error!(id = %record.id, "cache: refusing duplicate summary id");
            return false;
        }
        self.records.insert(record.id.clone(), record);
        true
    }

    /// `None` means the id is no longer cached (stale reference).
    pub fn update(&mut self, id: &SummaryId, patch: SummaryPatch) -> Option<Summary> {
        let record = self.records.get_mut(id)?;
        patch.apply(record);
        Some(record.clone())
    }

    pub fn remove(&mut self, id: &SummaryId) -> Option<Summary> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &SummaryId) -> Option<&Summary> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &SummaryId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Summary> {
        self.records.values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
