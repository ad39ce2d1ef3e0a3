use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::DirtyPageTable;
use crate::common::LSN;
use crate::transaction::TransactionTable;

/// Frozen copy of the transaction and dirty page tables.
///
/// The tables are owned values, so the snapshot shares nothing with the
/// live tables it was cloned from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// LSN of the Checkpoint log record.
    pub lsn: LSN,
    pub transaction_table: TransactionTable,
    pub dirty_page_table: DirtyPageTable,
    pub next_lsn: LSN,
}

/// Retains the latest checkpoint only.
#[derive(Debug, Clone, Default)]
pub struct CheckpointManager {
    latest: Option<Checkpoint>,
    taken: u64,
}

impl CheckpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_checkpoint(latest: Option<Checkpoint>) -> Self {
        Self { latest, taken: 0 }
    }

    pub fn take(
        &mut self,
        lsn: LSN,
        transaction_table: &TransactionTable,
        dirty_page_table: &DirtyPageTable,
        next_lsn: LSN,
    ) -> &Checkpoint {
        debug!(
            "Checkpoint at LSN {}: {} transactions, {} dirty pages",
            lsn,
            transaction_table.len(),
            dirty_page_table.len()
        );

        self.taken += 1;
        self.latest.insert(Checkpoint {
            lsn,
            transaction_table: transaction_table.clone(),
            dirty_page_table: dirty_page_table.clone(),
            next_lsn,
        })
    }

    pub fn latest(&self) -> Option<&Checkpoint> {
        self.latest.as_ref()
    }

    /// Working copies of the snapshot tables; empty when no checkpoint exists.
    pub fn restore(&self) -> (TransactionTable, DirtyPageTable) {
        match &self.latest {
            Some(checkpoint) => (
                checkpoint.transaction_table.clone(),
                checkpoint.dirty_page_table.clone(),
            ),
            None => (TransactionTable::new(), DirtyPageTable::new()),
        }
    }

    /// Checkpoints taken by this manager since it was created.
    pub fn checkpoints_taken(&self) -> u64 {
        self.taken
    }
}
