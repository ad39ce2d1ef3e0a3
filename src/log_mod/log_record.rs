use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::{PageID, TransactionID, LSN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogRecordType {
    Start,
    Update,
    Read,
    Commit,
    End,
    Abort,
    Clr,
    Checkpoint,
}

impl LogRecordType {
    pub const ALL: [LogRecordType; 8] = [
        LogRecordType::Start,
        LogRecordType::Update,
        LogRecordType::Read,
        LogRecordType::Commit,
        LogRecordType::End,
        LogRecordType::Abort,
        LogRecordType::Clr,
        LogRecordType::Checkpoint,
    ];
}

impl fmt::Display for LogRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogRecordType::Start => "Start",
            LogRecordType::Update => "Update",
            LogRecordType::Read => "Read",
            LogRecordType::Commit => "Commit",
            LogRecordType::End => "End",
            LogRecordType::Abort => "Abort",
            LogRecordType::Clr => "CLR",
            LogRecordType::Checkpoint => "Checkpoint",
        };
        f.write_str(name)
    }
}

/// A record as stored in the log. Only `persisted` changes after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub lsn: LSN,
    pub prev_lsn: Option<LSN>,
    pub txn_id: Option<TransactionID>,
    pub record_type: LogRecordType,
    pub page_id: Option<PageID>,
    pub value: Option<String>,
    pub prev_value: Option<String>,
    pub persisted: bool,
}

impl LogRecord {
    pub fn belongs_to(&self, txn_id: TransactionID) -> bool {
        self.txn_id == Some(txn_id)
    }

    pub fn touches(&self, page_id: &PageID) -> bool {
        self.page_id.as_ref() == Some(page_id)
    }
}

/// The caller-supplied part of a record; the log manager assigns the LSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogRecord {
    pub record_type: LogRecordType,
    pub txn_id: Option<TransactionID>,
    pub page_id: Option<PageID>,
    pub value: Option<String>,
    pub prev_value: Option<String>,
    pub prev_lsn: Option<LSN>,
}

impl NewLogRecord {
    pub fn new(record_type: LogRecordType) -> Self {
        Self {
            record_type,
            txn_id: None,
            page_id: None,
            value: None,
            prev_value: None,
            prev_lsn: None,
        }
    }

    pub fn txn(mut self, txn_id: TransactionID) -> Self {
        self.txn_id = Some(txn_id);
        self
    }

    pub fn page(mut self, page_id: PageID) -> Self {
        self.page_id = Some(page_id);
        self
    }

    pub fn value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn prev_value(mut self, prev_value: Option<String>) -> Self {
        self.prev_value = prev_value;
        self
    }

    pub fn prev_lsn(mut self, prev_lsn: Option<LSN>) -> Self {
        self.prev_lsn = prev_lsn;
        self
    }
}
