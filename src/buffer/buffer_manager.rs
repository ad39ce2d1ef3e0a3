use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{PageID, LSN};

/// A page held in memory with a pending, possibly uncommitted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferPage {
    pub page_id: PageID,
    pub value: String,
    pub page_lsn: Option<LSN>,
}

impl BufferPage {
    pub fn new(page_id: PageID, value: String, page_lsn: Option<LSN>) -> Self {
        Self {
            page_id,
            value,
            page_lsn,
        }
    }
}

/// Page cache. Unbounded: pages leave only through flush or a crash.
#[derive(Debug, Clone, Default)]
pub struct BufferManager {
    pages: BTreeMap<PageID, BufferPage>,
}

impl BufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_page(&self, page_id: &PageID) -> Option<&BufferPage> {
        self.pages.get(page_id)
    }

    pub fn contains(&self, page_id: &PageID) -> bool {
        self.pages.contains_key(page_id)
    }

    /// Insert the page, or overwrite value and pageLSN in place.
    pub fn put_page(&mut self, page_id: PageID, value: String, page_lsn: Option<LSN>) {
        match self.pages.get_mut(&page_id) {
            Some(page) => {
                page.value = value;
                page.page_lsn = page_lsn;
            }
            None => {
                self.pages
                    .insert(page_id.clone(), BufferPage::new(page_id, value, page_lsn));
            }
        }
    }

    pub fn remove_page(&mut self, page_id: &PageID) -> Option<BufferPage> {
        self.pages.remove(page_id)
    }

    pub fn discard_all_pages(&mut self) {
        self.pages.clear();
    }

    pub fn pages(&self) -> impl Iterator<Item = &BufferPage> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
