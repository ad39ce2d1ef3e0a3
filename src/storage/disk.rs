use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{PageID, LSN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurablePage {
    pub page_id: PageID,
    pub value: String,
    pub page_lsn: Option<LSN>,
}

/// The modeled "disk". Written by flush and by undo during recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableStore {
    pages: BTreeMap<PageID, DurablePage>,
}

impl DurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_page(&self, page_id: &PageID) -> Option<&DurablePage> {
        self.pages.get(page_id)
    }

    pub fn value(&self, page_id: &PageID) -> Option<&str> {
        self.pages.get(page_id).map(|page| page.value.as_str())
    }

    pub fn write_page(&mut self, page_id: PageID, value: String, page_lsn: Option<LSN>) -> &DurablePage {
        let page = self.pages.entry(page_id.clone()).or_insert_with(|| DurablePage {
            page_id,
            value: String::new(),
            page_lsn: None,
        });
        page.value = value;
        page.page_lsn = page_lsn;
        page
    }

    pub fn pages(&self) -> impl Iterator<Item = &DurablePage> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
