use std::collections::HashSet;
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::common::{AriesError, PageID, Result, TransactionID, LSN};
use crate::engine::Engine;
use crate::log_mod::{LogRecord, LogRecordType};
use crate::transaction::TransactionStatus;

/// Lifecycle of the engine around a crash:
/// `Running -> Crashed -> Analyzing -> Undoing -> Recovered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryState {
    Running,
    Crashed,
    Analyzing,
    Undoing,
    Recovered,
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryState::Running => "running",
            RecoveryState::Crashed => "crashed",
            RecoveryState::Analyzing => "analyzing",
            RecoveryState::Undoing => "undoing",
            RecoveryState::Recovered => "recovered",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub losers: Vec<TransactionID>,
    /// LSNs of the CLRs written, in the order they were appended.
    pub clr_lsns: Vec<LSN>,
    pub pages_restored: Vec<PageID>,
}

impl Engine {
    /// Lose everything volatile: buffer, dirty page table, transaction
    /// table and every log record that was never forced. Returns how many
    /// log records were lost.
    pub fn simulate_crash(&mut self) -> Result<usize> {
        self.ensure_running("crash")?;

        self.discard_volatile_state();
        let lost = self.log.truncate_unpersisted();
        self.state = RecoveryState::Crashed;

        warn!(
            "Crash: volatile state discarded, {} unforced log records lost, {} survive",
            lost,
            self.log.len()
        );
        Ok(lost)
    }

    /// Run analysis and undo. The engine ends in `Recovered` and accepts
    /// new operations.
    pub fn restart(&mut self) -> Result<RecoveryReport> {
        self.load_checkpoint()?;
        let losers = self.identify_losers()?;
        let clr_lsns = self.undo()?;

        let mut pages_restored: Vec<PageID> = clr_lsns
            .iter()
            .filter_map(|lsn| self.log.get(*lsn))
            .filter_map(|record| record.page_id.clone())
            .collect();
        pages_restored.sort();
        pages_restored.dedup();

        info!(
            "Recovery complete: {} losers, {} CLRs, {} pages restored",
            losers.len(),
            clr_lsns.len(),
            pages_restored.len()
        );

        Ok(RecoveryReport {
            losers,
            clr_lsns,
            pages_restored,
        })
    }

    /// Analysis: restore the transaction and dirty page tables from the
    /// latest checkpoint, or start empty when there is none.
    pub fn load_checkpoint(&mut self) -> Result<()> {
        self.transition(RecoveryState::Crashed, RecoveryState::Analyzing, "load checkpoint")?;

        let (transactions, dirty_pages) = self.checkpoints.restore();
        self.transactions = transactions;
        self.dirty_pages = dirty_pages;

        match self.checkpoints.latest() {
            Some(checkpoint) => info!(
                "Analysis: restored checkpoint at LSN {} ({} transactions, {} dirty pages)",
                checkpoint.lsn,
                self.transactions.len(),
                self.dirty_pages.len()
            ),
            None => info!("Analysis: no checkpoint, starting from empty tables"),
        }

        if self.config.analyze_log_tail {
            self.analyze_log_tail();
        }
        Ok(())
    }

    /// Fold the surviving records written after the checkpoint into the
    /// working transaction table.
    fn analyze_log_tail(&mut self) {
        let boundary = self.checkpoints.latest().map(|checkpoint| checkpoint.lsn);
        let tail = self
            .log
            .records()
            .iter()
            .filter(|record| boundary.map_or(true, |boundary| record.lsn > boundary));

        for record in tail {
            let Some(txn_id) = record.txn_id else {
                continue;
            };
            match record.record_type {
                LogRecordType::Commit => self.transactions.mark_committed(txn_id, Some(record.lsn)),
                LogRecordType::Abort => {
                    self.transactions.mark_aborted(txn_id, Some(record.lsn));
                }
                LogRecordType::End => self.transactions.advance_lsn(txn_id, record.lsn),
                _ => self.transactions.record_lsn(txn_id, record.lsn),
            }
        }
        debug!("Analysis: log tail folded, {} transactions known", self.transactions.len());
    }

    /// Flip every still-Active transaction to Aborted and return the full
    /// set of Aborted transactions.
    pub fn identify_losers(&mut self) -> Result<Vec<TransactionID>> {
        if self.state != RecoveryState::Analyzing {
            return Err(AriesError::InvalidState {
                operation: "identify losers",
                state: self.state,
            });
        }

        for txn_id in self.transactions.with_status(TransactionStatus::Active) {
            self.transactions.mark_aborted(txn_id, None);
            debug!("{} was active at crash time", txn_id);
        }

        let losers = self.transactions.with_status(TransactionStatus::Aborted);
        info!("Analysis: losers {:?}", losers);
        Ok(losers)
    }

    /// Undo every loser update, newest first across all losers, writing a
    /// CLR for each and restoring the before value directly on the durable
    /// store. Returns the CLR LSNs.
    pub fn undo(&mut self) -> Result<Vec<LSN>> {
        self.transition(RecoveryState::Analyzing, RecoveryState::Undoing, "undo")?;

        let losers: HashSet<TransactionID> = self
            .transactions
            .with_status(TransactionStatus::Aborted)
            .into_iter()
            .collect();
        let compensated: HashSet<LSN> = self
            .log
            .records()
            .iter()
            .filter(|record| record.record_type == LogRecordType::Clr)
            .filter_map(|record| record.prev_lsn)
            .collect();

        let mut updates: Vec<LogRecord> = self
            .log
            .records()
            .iter()
            .filter(|record| record.record_type == LogRecordType::Update)
            .filter(|record| record.txn_id.map_or(false, |txn_id| losers.contains(&txn_id)))
            .filter(|record| !compensated.contains(&record.lsn))
            .cloned()
            .collect();
        updates.sort_by(|a, b| b.lsn.cmp(&a.lsn));

        let mut clr_lsns = Vec::with_capacity(updates.len());
        for update in updates {
            let Some(page_id) = update.page_id else {
                continue;
            };
            let restored = update.prev_value.unwrap_or_default();

            let clr = self
                .log
                .log_clr(update.txn_id, page_id.clone(), Some(restored.clone()), update.lsn);
            if let Some(txn_id) = update.txn_id {
                self.transactions.mark_aborted(txn_id, Some(clr));
            }
            self.disk.write_page(page_id.clone(), restored, Some(clr));

            debug!("Undo: LSN {} on page {} compensated by CLR {}", update.lsn, page_id, clr);
            clr_lsns.push(clr);
        }

        self.state = RecoveryState::Recovered;
        Ok(clr_lsns)
    }

    fn transition(&mut self, from: RecoveryState, to: RecoveryState, operation: &'static str) -> Result<()> {
        if self.state != from {
            return Err(AriesError::InvalidState {
                operation,
                state: self.state,
            });
        }
        debug!("Recovery state {} -> {}", from, to);
        self.state = to;
        Ok(())
    }
}
