use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{PageID, TransactionID, LSN};
use crate::storage::DurablePage;

/// One step submitted by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Write {
        txn_id: TransactionID,
        page_id: PageID,
        value: String,
    },
    Read {
        txn_id: TransactionID,
        page_id: PageID,
    },
    Commit {
        txn_id: TransactionID,
    },
    End {
        txn_id: TransactionID,
    },
    Abort {
        txn_id: TransactionID,
    },
    Checkpoint,
    Flush {
        page_id: PageID,
        txn_id: Option<TransactionID>,
    },
}

impl Operation {
    pub fn write(txn_id: u64, page_id: &str, value: &str) -> Self {
        Operation::Write {
            txn_id: TransactionID(txn_id),
            page_id: PageID::from(page_id),
            value: value.to_string(),
        }
    }

    pub fn read(txn_id: u64, page_id: &str) -> Self {
        Operation::Read {
            txn_id: TransactionID(txn_id),
            page_id: PageID::from(page_id),
        }
    }

    pub fn commit(txn_id: u64) -> Self {
        Operation::Commit {
            txn_id: TransactionID(txn_id),
        }
    }

    pub fn end(txn_id: u64) -> Self {
        Operation::End {
            txn_id: TransactionID(txn_id),
        }
    }

    pub fn abort(txn_id: u64) -> Self {
        Operation::Abort {
            txn_id: TransactionID(txn_id),
        }
    }

    pub fn flush(page_id: &str) -> Self {
        Operation::Flush {
            page_id: PageID::from(page_id),
            txn_id: None,
        }
    }

    pub fn txn_id(&self) -> Option<TransactionID> {
        match self {
            Operation::Write { txn_id, .. }
            | Operation::Read { txn_id, .. }
            | Operation::Commit { txn_id }
            | Operation::End { txn_id }
            | Operation::Abort { txn_id } => Some(*txn_id),
            Operation::Flush { txn_id, .. } => *txn_id,
            Operation::Checkpoint => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Write {
                txn_id,
                page_id,
                value,
            } => write!(f, "write_item({txn_id}, {page_id}, {value:?})"),
            Operation::Read { txn_id, page_id } => write!(f, "read_item({txn_id}, {page_id})"),
            Operation::Commit { txn_id } => write!(f, "commit({txn_id})"),
            Operation::End { txn_id } => write!(f, "end({txn_id})"),
            Operation::Abort { txn_id } => write!(f, "abort({txn_id})"),
            Operation::Checkpoint => f.write_str("checkpoint"),
            Operation::Flush { page_id, .. } => write!(f, "flush({page_id})"),
        }
    }
}

/// What a dispatched operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A record was appended at this LSN.
    Logged(LSN),
    /// A Read record was appended; `value` is what the caller sees.
    Read { lsn: LSN, value: Option<String> },
    /// The buffered page was written to the durable store.
    Flushed(DurablePage),
    /// Nothing changed: flush of an unbuffered page, or a repeated commit.
    NoOp,
}
