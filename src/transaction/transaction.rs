use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{TransactionID, LSN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Active,
    Committed,
    Aborted,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStatus::Active => "Active",
            TransactionStatus::Committed => "Committed",
            TransactionStatus::Aborted => "Aborted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTableEntry {
    pub txn_id: TransactionID,
    pub status: TransactionStatus,
    pub last_lsn: Option<LSN>,
}

impl TransactionTableEntry {
    pub fn new(txn_id: TransactionID, status: TransactionStatus, last_lsn: Option<LSN>) -> Self {
        Self {
            txn_id,
            status,
            last_lsn,
        }
    }
}

/// In-flight transactions. Entries are never removed by normal
/// operation; only a crash wipes the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTable {
    entries: BTreeMap<TransactionID, TransactionTableEntry>,
}

impl TransactionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, txn_id: TransactionID) -> Option<&TransactionTableEntry> {
        self.entries.get(&txn_id)
    }

    pub fn contains(&self, txn_id: TransactionID) -> bool {
        self.entries.contains_key(&txn_id)
    }

    pub fn status(&self, txn_id: TransactionID) -> Option<TransactionStatus> {
        self.entries.get(&txn_id).map(|entry| entry.status)
    }

    pub fn last_lsn(&self, txn_id: TransactionID) -> Option<LSN> {
        self.entries.get(&txn_id).and_then(|entry| entry.last_lsn)
    }

    /// Create the entry as Active, or just advance its lastLSN.
    pub fn record_lsn(&mut self, txn_id: TransactionID, lsn: LSN) {
        self.entries
            .entry(txn_id)
            .and_modify(|entry| entry.last_lsn = Some(lsn))
            .or_insert_with(|| TransactionTableEntry::new(txn_id, TransactionStatus::Active, Some(lsn)));
    }

    /// Advance lastLSN of an existing entry. Unknown transactions are ignored.
    pub fn advance_lsn(&mut self, txn_id: TransactionID, lsn: LSN) {
        if let Some(entry) = self.entries.get_mut(&txn_id) {
            entry.last_lsn = Some(lsn);
        }
    }

    pub fn mark_committed(&mut self, txn_id: TransactionID, lsn: Option<LSN>) {
        let entry = self
            .entries
            .entry(txn_id)
            .or_insert_with(|| TransactionTableEntry::new(txn_id, TransactionStatus::Active, None));
        entry.status = TransactionStatus::Committed;
        if lsn.is_some() {
            entry.last_lsn = lsn;
        }
    }

    /// Flip to Aborted unless already Committed. Returns the resulting status.
    pub fn mark_aborted(&mut self, txn_id: TransactionID, lsn: Option<LSN>) -> TransactionStatus {
        let entry = self
            .entries
            .entry(txn_id)
            .or_insert_with(|| TransactionTableEntry::new(txn_id, TransactionStatus::Active, None));
        if entry.status != TransactionStatus::Committed {
            entry.status = TransactionStatus::Aborted;
        }
        if lsn.is_some() {
            entry.last_lsn = lsn;
        }
        entry.status
    }

    pub fn with_status(&self, status: TransactionStatus) -> Vec<TransactionID> {
        self.entries
            .values()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.txn_id)
            .collect()
    }

    pub fn entries(&self) -> Vec<TransactionTableEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
