use std::collections::HashMap;

use log::debug;

use super::log_record::{LogRecord, LogRecordType, NewLogRecord};
use crate::common::{AriesError, PageID, Result, TransactionID, LSN};

/// Append-only, in-memory write-ahead log.
///
/// Every record gets `LSN = len(log)` at append time. Records are never
/// edited afterwards except for the `persisted` flag, which only moves from
/// `false` to `true` when the log is forced.
#[derive(Debug, Clone, Default)]
pub struct LogManager {
    records: Vec<LogRecord>,
    record_counts: HashMap<LogRecordType, u64>,
}

impl LogManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from records exported earlier. LSNs must be gapless
    /// and start at zero.
    pub fn from_records(records: Vec<LogRecord>) -> Result<Self> {
        let mut record_counts = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            if record.lsn.0 != index as u64 {
                return Err(AriesError::CorruptImage {
                    expected: index as u64,
                    found: record.lsn.0,
                });
            }
            *record_counts.entry(record.record_type).or_insert(0) += 1;
        }

        Ok(Self {
            records,
            record_counts,
        })
    }

    pub fn next_lsn(&self) -> LSN {
        LSN(self.records.len() as u64)
    }

    pub fn append(&mut self, new_record: NewLogRecord) -> LSN {
        let lsn = self.next_lsn();
        let record = LogRecord {
            lsn,
            prev_lsn: new_record.prev_lsn,
            txn_id: new_record.txn_id,
            record_type: new_record.record_type,
            page_id: new_record.page_id,
            value: new_record.value,
            prev_value: new_record.prev_value,
            persisted: false,
        };

        debug!(
            "LSN {}: {} txn={:?} page={:?}",
            lsn, record.record_type, record.txn_id, record.page_id
        );

        *self.record_counts.entry(record.record_type).or_insert(0) += 1;
        self.records.push(record);
        lsn
    }

    pub fn log_start(&mut self, txn_id: TransactionID) -> LSN {
        self.append(NewLogRecord::new(LogRecordType::Start).txn(txn_id))
    }

    pub fn log_update(
        &mut self,
        txn_id: TransactionID,
        page_id: PageID,
        value: String,
        prev_value: String,
        prev_lsn: Option<LSN>,
    ) -> LSN {
        self.append(
            NewLogRecord::new(LogRecordType::Update)
                .txn(txn_id)
                .page(page_id)
                .value(Some(value))
                .prev_value(Some(prev_value))
                .prev_lsn(prev_lsn),
        )
    }

    pub fn log_read(
        &mut self,
        txn_id: TransactionID,
        page_id: PageID,
        value: Option<String>,
        prev_lsn: Option<LSN>,
    ) -> LSN {
        self.append(
            NewLogRecord::new(LogRecordType::Read)
                .txn(txn_id)
                .page(page_id)
                .value(value)
                .prev_lsn(prev_lsn),
        )
    }

    pub fn log_commit(&mut self, txn_id: TransactionID, prev_lsn: Option<LSN>) -> LSN {
        self.append(
            NewLogRecord::new(LogRecordType::Commit)
                .txn(txn_id)
                .prev_lsn(prev_lsn),
        )
    }

    pub fn log_end(&mut self, txn_id: TransactionID, prev_lsn: Option<LSN>) -> LSN {
        self.append(NewLogRecord::new(LogRecordType::End).txn(txn_id).prev_lsn(prev_lsn))
    }

    pub fn log_abort(&mut self, txn_id: TransactionID, prev_lsn: Option<LSN>) -> LSN {
        self.append(
            NewLogRecord::new(LogRecordType::Abort)
                .txn(txn_id)
                .prev_lsn(prev_lsn),
        )
    }

    /// Compensation record for the update at `undone_lsn`.
    pub fn log_clr(
        &mut self,
        txn_id: Option<TransactionID>,
        page_id: PageID,
        value: Option<String>,
        undone_lsn: LSN,
    ) -> LSN {
        let mut record = NewLogRecord::new(LogRecordType::Clr)
            .page(page_id)
            .value(value)
            .prev_lsn(Some(undone_lsn));
        record.txn_id = txn_id;
        self.append(record)
    }

    pub fn log_checkpoint(&mut self) -> LSN {
        self.append(NewLogRecord::new(LogRecordType::Checkpoint))
    }

    /// Force the log: every record currently present becomes durable.
    pub fn mark_all_persisted(&mut self) {
        let mut forced = 0;
        for record in self.records.iter_mut().filter(|r| !r.persisted) {
            record.persisted = true;
            forced += 1;
        }
        if forced > 0 {
            debug!("Forced {} log records", forced);
        }
    }

    /// Drop every record that was never forced. Returns how many were lost.
    pub fn truncate_unpersisted(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|record| record.persisted);

        self.record_counts.clear();
        for record in &self.records {
            *self.record_counts.entry(record.record_type).or_insert(0) += 1;
        }

        before - self.records.len()
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn get(&self, lsn: LSN) -> Option<&LogRecord> {
        self.records.get(lsn.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn entries_for_page<'a>(
        &'a self,
        page_id: &'a PageID,
        record_type: Option<LogRecordType>,
    ) -> impl DoubleEndedIterator<Item = &'a LogRecord> + 'a {
        self.records.iter().filter(move |record| {
            record.touches(page_id) && record_type.map_or(true, |t| record.record_type == t)
        })
    }

    pub fn entries_for_txn(
        &self,
        txn_id: TransactionID,
        record_type: Option<LogRecordType>,
    ) -> impl DoubleEndedIterator<Item = &LogRecord> + '_ {
        self.records.iter().filter(move |record| {
            record.belongs_to(txn_id) && record_type.map_or(true, |t| record.record_type == t)
        })
    }

    pub fn last_update_for_page<'a>(&'a self, page_id: &'a PageID) -> Option<&'a LogRecord> {
        self.entries_for_page(page_id, Some(LogRecordType::Update))
            .next_back()
    }

    pub fn has_records_for(&self, txn_id: TransactionID) -> bool {
        self.records.iter().any(|record| record.belongs_to(txn_id))
    }

    pub fn last_lsn_for_txn(&self, txn_id: TransactionID) -> Option<LSN> {
        self.entries_for_txn(txn_id, None).next_back().map(|r| r.lsn)
    }

    /// LSN of the newest Checkpoint record strictly older than `before`.
    pub fn last_checkpoint_before(&self, before: LSN) -> Option<LSN> {
        self.records
            .iter()
            .rev()
            .filter(|record| record.lsn < before)
            .find(|record| record.record_type == LogRecordType::Checkpoint)
            .map(|record| record.lsn)
    }

    /// Whether a CLR compensating the update at `lsn` is present.
    pub fn is_compensated(&self, lsn: LSN) -> bool {
        self.records
            .iter()
            .any(|record| record.record_type == LogRecordType::Clr && record.prev_lsn == Some(lsn))
    }

    pub fn get_total_log_records(&self) -> u64 {
        self.record_counts.values().sum()
    }

    pub fn get_total_log_records_of_type(&self, record_type: LogRecordType) -> u64 {
        *self.record_counts.get(&record_type).unwrap_or(&0)
    }
}
