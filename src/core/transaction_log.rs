//! Append-only transaction history
//!
//! This module provides the `TransactionLog`, the ordered record of every
//! committed ledger operation. It is both the audit trail and the source a
//! replay rebuilds the AccountStore from.
//!
//! # Design
//!
//! All records live in a single vector guarded by one `RwLock`. Taking the
//! write lock is the single serialization point for sequence assignment, which
//! makes numbering atomic and gap-free. A per-account index of positions lets
//! `history_for` answer without scanning the whole log.
//!
//! The log never removes anything; growth is unbounded.

use crate::types::{
    AccountId, Amount, LedgerError, RecordDraft, Sequence, TransactionKind, TransactionRecord,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct LogState {
    /// Records in sequence order; `records[i].sequence == i + 1`
    records: Vec<Arc<TransactionRecord>>,

    /// Positions into `records`, per subject account, ascending
    by_account: HashMap<AccountId, Vec<usize>>,
}

impl LogState {
    fn next_sequence(&self) -> Sequence {
        Sequence(self.records.len() as u64 + 1)
    }

    /// Commit time for the next record, clamped so it never goes backwards
    fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.records.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    fn push(&mut self, record: TransactionRecord) {
        let position = self.records.len();
        self.by_account
            .entry(record.account_id)
            .or_default()
            .push(position);
        self.records.push(Arc::new(record));
    }
}

/// Ordered, append-only record of committed operations
///
/// Cloning a `TransactionLog` yields another handle onto the same history.
/// Only the engine appends; everything public is read-only.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    state: Arc<RwLock<LogState>>,
}

impl TransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single record
    ///
    /// Assigns the next sequence number and timestamp. Never fails.
    ///
    /// # Returns
    ///
    /// The sequence number assigned to the record
    pub(crate) fn append(&self, draft: RecordDraft) -> Sequence {
        let mut state = self.state.write();
        let sequence = state.next_sequence();
        let record = TransactionRecord {
            sequence,
            kind: draft.kind,
            account_id: draft.account_id,
            counterparty_id: None,
            linked_sequence: None,
            amount: draft.amount,
            timestamp: state.stamp(),
            registrant: draft.registrant,
        };
        state.push(record);
        sequence
    }

    /// Append the linked TransferOut/TransferIn pair of one transfer
    ///
    /// Both records are written under a single lock acquisition, so they occupy
    /// consecutive sequence numbers (Out first) and share one timestamp.
    ///
    /// # Returns
    ///
    /// `(out_sequence, in_sequence)`
    pub(crate) fn append_transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> (Sequence, Sequence) {
        let mut state = self.state.write();
        let out_sequence = state.next_sequence();
        let in_sequence = out_sequence.next();
        let timestamp = state.stamp();

        state.push(TransactionRecord {
            sequence: out_sequence,
            kind: TransactionKind::TransferOut,
            account_id: from,
            counterparty_id: Some(to),
            linked_sequence: Some(in_sequence),
            amount,
            timestamp,
            registrant: None,
        });
        state.push(TransactionRecord {
            sequence: in_sequence,
            kind: TransactionKind::TransferIn,
            account_id: to,
            counterparty_id: Some(from),
            linked_sequence: Some(out_sequence),
            amount,
            timestamp,
            registrant: None,
        });

        (out_sequence, in_sequence)
    }

    /// Re-append a record read back from a journal
    ///
    /// The record keeps its own sequence number and timestamp; both must
    /// continue the log exactly.
    pub(crate) fn restore(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        let expected = state.next_sequence();
        if record.sequence != expected {
            return Err(LedgerError::corrupt_journal(
                record.sequence,
                format!("expected sequence {}", expected),
            ));
        }
        if let Some(last) = state.records.last() {
            if record.timestamp < last.timestamp {
                return Err(LedgerError::corrupt_journal(
                    record.sequence,
                    "timestamp goes backwards",
                ));
            }
        }
        state.push(record);
        Ok(())
    }

    /// All records whose subject is `account`, in ascending sequence order
    ///
    /// The result covers the records committed at the time of the call and is
    /// not extended by later appends.
    pub fn history_for(&self, account: AccountId) -> History {
        let positions: Arc<[usize]> = self
            .state
            .read()
            .by_account
            .get(&account)
            .map(|positions| Arc::from(positions.as_slice()))
            .unwrap_or_else(|| Arc::from(Vec::<usize>::new()));

        History {
            state: Arc::clone(&self.state),
            positions,
        }
    }

    /// Look up a record by sequence number
    pub fn get(&self, sequence: Sequence) -> Option<Arc<TransactionRecord>> {
        let index = usize::try_from(sequence.0.checked_sub(1)?).ok()?;
        self.state.read().records.get(index).cloned()
    }

    /// Snapshot of the whole log, in sequence order
    pub fn records(&self) -> Vec<Arc<TransactionRecord>> {
        self.state.read().records.clone()
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered history of one account
///
/// Records are fetched from the log lazily while iterating. The sequence is
/// finite and restartable: every call to [`History::iter`] starts again from
/// the oldest record.
#[derive(Debug, Clone)]
pub struct History {
    state: Arc<RwLock<LogState>>,
    positions: Arc<[usize]>,
}

impl History {
    pub fn iter(&self) -> HistoryIter<'_> {
        HistoryIter {
            history: self,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Materialize the history
    pub fn to_vec(&self) -> Vec<Arc<TransactionRecord>> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = Arc<TransactionRecord>;
    type IntoIter = HistoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`History`]
#[derive(Debug)]
pub struct HistoryIter<'a> {
    history: &'a History,
    cursor: usize,
}

impl Iterator for HistoryIter<'_> {
    type Item = Arc<TransactionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = *self.history.positions.get(self.cursor)?;
        self.cursor += 1;
        self.history.state.read().records.get(position).cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.history.positions.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HistoryIter<'_> {}
