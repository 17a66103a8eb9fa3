use farefinder_core::SearchParams;
use serde::Serialize;
use std::collections::VecDeque;

pub const HISTORY_CAPACITY: usize = 5;

/// Most-recent-first record of attempted searches, bounded at
/// [`HISTORY_CAPACITY`]. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SearchHistory {
    entries: VecDeque<SearchParams>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Insert at the front, returning the entry evicted from the back if the
    /// ring was full.
    pub fn record(&mut self, params: SearchParams) -> Option<SearchParams> {
        self.entries.push_front(params);
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_back()
        } else {
            None
        }
    }

    pub fn latest(&self) -> Option<&SearchParams> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchParams> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<SearchParams> {
        self.entries.iter().cloned().collect()
    }
}
