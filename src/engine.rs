use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::buffer::{BufferManager, BufferPage, DirtyPageEntry, DirtyPageTable};
use crate::checkpoint::{Checkpoint, CheckpointManager};
use crate::common::{AriesError, EngineConfig, PageID, Result, TransactionID, LSN};
use crate::log_mod::{LogManager, LogRecord, LogRecordType};
use crate::operation::{Operation, Outcome};
use crate::recovery::RecoveryState;
use crate::storage::{DurableImage, DurablePage, DurableStore};
use crate::transaction::{TransactionStatus, TransactionTable, TransactionTableEntry};

/// Owned copies of every inspectable table, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub state: RecoveryState,
    pub cursor: usize,
    pub log: Vec<LogRecord>,
    pub buffer: Vec<BufferPage>,
    pub transaction_table: Vec<TransactionTableEntry>,
    pub dirty_page_table: Vec<DirtyPageEntry>,
    pub disk: Vec<DurablePage>,
    pub checkpoint: Option<Checkpoint>,
}

/// The whole engine context. Every handler takes `&mut self`; there is no
/// shared or global state.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) log: LogManager,
    pub(crate) buffer: BufferManager,
    pub(crate) dirty_pages: DirtyPageTable,
    pub(crate) transactions: TransactionTable,
    pub(crate) checkpoints: CheckpointManager,
    pub(crate) disk: DurableStore,
    pub(crate) state: RecoveryState,
    cursor: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            log: LogManager::new(),
            buffer: BufferManager::new(),
            dirty_pages: DirtyPageTable::new(),
            transactions: TransactionTable::new(),
            checkpoints: CheckpointManager::new(),
            disk: DurableStore::new(),
            state: RecoveryState::Running,
            cursor: 0,
        }
    }

    /// Rebuild an engine from what survived a crash. The engine starts in
    /// `Crashed`; call `restart` before dispatching.
    pub fn from_durable_image(image: DurableImage, config: EngineConfig) -> Result<Self> {
        let mut log = LogManager::from_records(image.log)?;
        log.mark_all_persisted();

        info!(
            "Opened durable image: {} log records, {} durable pages, checkpoint={}",
            log.len(),
            image.disk.len(),
            image.checkpoint.is_some()
        );

        Ok(Self {
            config,
            log,
            buffer: BufferManager::new(),
            dirty_pages: DirtyPageTable::new(),
            transactions: TransactionTable::new(),
            checkpoints: CheckpointManager::from_checkpoint(image.checkpoint),
            disk: image.disk,
            state: RecoveryState::Crashed,
            cursor: 0,
        })
    }

    /// Throw everything away, keeping only the configuration.
    pub fn reset(&mut self) {
        *self = Self::with_config(self.config.clone());
    }

    pub(crate) fn discard_volatile_state(&mut self) {
        self.buffer.discard_all_pages();
        self.dirty_pages.clear();
        self.transactions.clear();
    }

    pub(crate) fn ensure_running(&self, operation: &'static str) -> Result<()> {
        match self.state {
            RecoveryState::Running | RecoveryState::Recovered => Ok(()),
            state => Err(AriesError::InvalidState { operation, state }),
        }
    }

    pub fn dispatch(&mut self, operation: Operation) -> Result<Outcome> {
        self.ensure_running("dispatch")?;
        debug!("#{} {}", self.cursor, operation);

        let outcome = match operation {
            Operation::Write {
                txn_id,
                page_id,
                value,
            } => Outcome::Logged(self.write(txn_id, page_id, value)?),
            Operation::Read { txn_id, page_id } => {
                let (lsn, value) = self.read(txn_id, page_id)?;
                Outcome::Read { lsn, value }
            }
            Operation::Commit { txn_id } => match self.commit(txn_id)? {
                Some(lsn) => Outcome::Logged(lsn),
                None => Outcome::NoOp,
            },
            Operation::End { txn_id } => Outcome::Logged(self.end(txn_id)?),
            Operation::Abort { txn_id } => Outcome::Logged(self.abort(txn_id)?),
            Operation::Checkpoint => Outcome::Logged(self.checkpoint()?),
            Operation::Flush { page_id, txn_id } => match self.flush(&page_id, txn_id)? {
                Some(page) => Outcome::Flushed(page),
                None => Outcome::NoOp,
            },
        };

        self.cursor += 1;
        Ok(outcome)
    }

    pub fn dispatch_all<I>(&mut self, operations: I) -> Result<Vec<Outcome>>
    where
        I: IntoIterator<Item = Operation>,
    {
        operations
            .into_iter()
            .map(|operation| self.dispatch(operation))
            .collect()
    }

    pub fn write(&mut self, txn_id: TransactionID, page_id: PageID, value: String) -> Result<LSN> {
        self.ensure_running("write")?;

        // Update-to-Update chaining: the last update of this page supplies
        // both prevLSN and the value an undo will restore.
        let (page_lsn, prev_value) = match self.log.last_update_for_page(&page_id) {
            Some(record) => (Some(record.lsn), record.value.clone().unwrap_or_default()),
            None => (None, String::new()),
        };

        self.ensure_started(txn_id);
        let lsn = self
            .log
            .log_update(txn_id, page_id.clone(), value.clone(), prev_value, page_lsn);

        self.transactions.record_lsn(txn_id, lsn);
        self.buffer.put_page(page_id.clone(), value, Some(lsn));
        if self.dirty_pages.mark_dirty(&page_id, lsn) {
            debug!("Page {} dirtied at LSN {}", page_id, lsn);
        }

        info!("{} wrote page {} (LSN {})", txn_id, page_id, lsn);
        Ok(lsn)
    }

    /// Returns the Read record's LSN and the value surfaced to the caller:
    /// the buffered copy if there is one, otherwise the durable value.
    pub fn read(&mut self, txn_id: TransactionID, page_id: PageID) -> Result<(LSN, Option<String>)> {
        self.ensure_running("read")?;
        self.ensure_started(txn_id);

        let durable = self.disk.get_page(&page_id).cloned();
        let surfaced = match self.buffer.get_page(&page_id) {
            Some(page) => Some(page.value.clone()),
            None => durable.as_ref().map(|page| page.value.clone()),
        };

        let prev_lsn = self.last_known_lsn(txn_id);
        let lsn = self.log.log_read(
            txn_id,
            page_id.clone(),
            durable.as_ref().map(|page| page.value.clone()),
            prev_lsn,
        );
        self.transactions.record_lsn(txn_id, lsn);

        // Page pull: the durable copy replaces whatever the buffer held.
        if let Some(page) = durable {
            self.buffer.put_page(page.page_id, page.value, page.page_lsn);
        }

        info!("{} read page {} (LSN {})", txn_id, page_id, lsn);
        Ok((lsn, surfaced))
    }

    /// Write the buffered page through to the durable store and force the
    /// log. Returns `None` when the page is not buffered.
    pub fn flush(&mut self, page_id: &PageID, txn_id: Option<TransactionID>) -> Result<Option<DurablePage>> {
        self.ensure_running("flush")?;
        Ok(self.flush_page(page_id, txn_id))
    }

    fn flush_page(&mut self, page_id: &PageID, txn_id: Option<TransactionID>) -> Option<DurablePage> {
        let Some(page) = self.buffer.remove_page(page_id) else {
            debug!("Flush of {} skipped: not buffered", page_id);
            return None;
        };

        let durable = self
            .disk
            .write_page(page.page_id, page.value, page.page_lsn)
            .clone();
        self.dirty_pages.remove(page_id);
        self.log.mark_all_persisted();

        match txn_id {
            Some(txn_id) => info!("{} flushed page {} (pageLSN {:?})", txn_id, page_id, durable.page_lsn),
            None => info!("Flushed page {} (pageLSN {:?})", page_id, durable.page_lsn),
        }
        Some(durable)
    }

    /// Returns the Commit record's LSN, or `None` when the transaction was
    /// already committed or aborted.
    pub fn commit(&mut self, txn_id: TransactionID) -> Result<Option<LSN>> {
        self.ensure_running("commit")?;
        Ok(self.commit_transaction(txn_id))
    }

    fn commit_transaction(&mut self, txn_id: TransactionID) -> Option<LSN> {
        match self.transactions.status(txn_id) {
            Some(TransactionStatus::Committed) => {
                debug!("{} already committed", txn_id);
                return None;
            }
            Some(TransactionStatus::Aborted) => {
                warn!("{} is aborted, commit ignored", txn_id);
                return None;
            }
            Some(TransactionStatus::Active) | None => {}
        }

        let prev_lsn = self.last_known_lsn(txn_id);
        let lsn = self.log.log_commit(txn_id, prev_lsn);
        self.transactions.mark_committed(txn_id, Some(lsn));

        info!("{} committed (LSN {})", txn_id, lsn);
        Some(lsn)
    }

    pub fn end(&mut self, txn_id: TransactionID) -> Result<LSN> {
        self.ensure_running("end")?;

        if self.config.force_pages_on_end {
            for page_id in self.buffered_pages_updated_by(txn_id) {
                self.flush_page(&page_id, Some(txn_id));
            }
        }

        let prev_lsn = self.last_known_lsn(txn_id);
        let lsn = self.log.log_end(txn_id, prev_lsn);
        self.transactions.advance_lsn(txn_id, lsn);

        info!("{} ended (LSN {})", txn_id, lsn);
        Ok(lsn)
    }

    /// Log the abort. The writes are rolled back by recovery, not here.
    pub fn abort(&mut self, txn_id: TransactionID) -> Result<LSN> {
        self.ensure_running("abort")?;

        let prev_lsn = self.last_known_lsn(txn_id);
        let lsn = self.log.log_abort(txn_id, prev_lsn);
        let status = self.transactions.mark_aborted(txn_id, Some(lsn));

        info!("{} aborted (LSN {}), status {}", txn_id, lsn, status);
        Ok(lsn)
    }

    pub fn checkpoint(&mut self) -> Result<LSN> {
        self.ensure_running("checkpoint")?;

        let lsn = self.log.log_checkpoint();

        if self.config.fold_ended_on_checkpoint {
            for txn_id in self.ended_since_previous_checkpoint(lsn) {
                self.commit_transaction(txn_id);
            }
        }

        self.log.mark_all_persisted();
        let next_lsn = self.log.next_lsn();
        self.checkpoints
            .take(lsn, &self.transactions, &self.dirty_pages, next_lsn);

        info!("Checkpoint taken (LSN {}, next LSN {})", lsn, next_lsn);
        Ok(lsn)
    }

    fn ended_since_previous_checkpoint(&self, checkpoint_lsn: LSN) -> Vec<TransactionID> {
        let previous = self.log.last_checkpoint_before(checkpoint_lsn);
        let mut ended: Vec<TransactionID> = self
            .log
            .records()
            .iter()
            .filter(|record| record.record_type == LogRecordType::End)
            .filter(|record| record.lsn < checkpoint_lsn)
            .filter(|record| previous.map_or(true, |previous| record.lsn > previous))
            .filter_map(|record| record.txn_id)
            .collect();
        ended.sort();
        ended.dedup();
        ended
    }

    fn buffered_pages_updated_by(&self, txn_id: TransactionID) -> Vec<PageID> {
        let mut pages: Vec<PageID> = self
            .log
            .entries_for_txn(txn_id, Some(LogRecordType::Update))
            .filter_map(|record| record.page_id.clone())
            .filter(|page_id| self.buffer.contains(page_id))
            .collect();
        pages.sort();
        pages.dedup();
        pages
    }

    /// WAL rule: a transaction's first record is always Start.
    fn ensure_started(&mut self, txn_id: TransactionID) {
        if !self.log.has_records_for(txn_id) {
            let lsn = self.log.log_start(txn_id);
            debug!("{} started (LSN {})", txn_id, lsn);
        }
    }

    fn last_known_lsn(&self, txn_id: TransactionID) -> Option<LSN> {
        self.transactions
            .last_lsn(txn_id)
            .or_else(|| self.log.last_lsn_for_txn(txn_id))
    }

    pub fn durable_image(&self) -> DurableImage {
        DurableImage {
            log: self
                .log
                .records()
                .iter()
                .filter(|record| record.persisted)
                .cloned()
                .collect(),
            checkpoint: self.checkpoints.latest().cloned(),
            disk: self.disk.clone(),
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            cursor: self.cursor,
            log: self.log.records().to_vec(),
            buffer: self.buffer.pages().cloned().collect(),
            transaction_table: self.transactions.entries(),
            dirty_page_table: self.dirty_pages.entries(),
            disk: self.disk.pages().cloned().collect(),
            checkpoint: self.checkpoints.latest().cloned(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn log(&self) -> &LogManager {
        &self.log
    }

    pub fn buffer(&self) -> &BufferManager {
        &self.buffer
    }

    pub fn dirty_page_table(&self) -> &DirtyPageTable {
        &self.dirty_pages
    }

    pub fn transaction_table(&self) -> &TransactionTable {
        &self.transactions
    }

    pub fn disk(&self) -> &DurableStore {
        &self.disk
    }

    pub fn checkpoint_snapshot(&self) -> Option<&Checkpoint> {
        self.checkpoints.latest()
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Number of operations dispatched so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}
