use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{PageID, LSN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyPageEntry {
    pub page_id: PageID,
    pub rec_lsn: LSN,
}

/// Pages whose buffered content has not reached the durable store, keyed
/// to the LSN of the first update that dirtied them since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyPageTable {
    entries: BTreeMap<PageID, LSN>,
}

impl DirtyPageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `rec_lsn` unless the page is already dirty. Returns whether
    /// a new entry was created.
    pub fn mark_dirty(&mut self, page_id: &PageID, rec_lsn: LSN) -> bool {
        if self.entries.contains_key(page_id) {
            return false;
        }
        self.entries.insert(page_id.clone(), rec_lsn);
        true
    }

    pub fn rec_lsn(&self, page_id: &PageID) -> Option<LSN> {
        self.entries.get(page_id).copied()
    }

    pub fn contains(&self, page_id: &PageID) -> bool {
        self.entries.contains_key(page_id)
    }

    pub fn remove(&mut self, page_id: &PageID) -> Option<LSN> {
        self.entries.remove(page_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> Vec<DirtyPageEntry> {
        self.entries
            .iter()
            .map(|(page_id, rec_lsn)| DirtyPageEntry {
                page_id: page_id.clone(),
                rec_lsn: *rec_lsn,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
