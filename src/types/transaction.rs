//! Transaction-related types for the ledger engine
//!
//! This module defines the immutable history records kept by the
//! TransactionLog and the receipts returned to callers when an operation
//! commits.

use super::account::{AccountId, Amount, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global commit sequence number
///
/// Starts at 1 and is gap-free across the whole log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(pub u64);

impl Sequence {
    pub(crate) fn next(self) -> Sequence {
        Sequence(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of records the ledger writes to its history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A new account was opened with a zero balance
    Registration,

    /// Funds were credited from outside the ledger
    Deposit,

    /// Funds left the ledger
    Withdrawal,

    /// Sender side of a transfer
    ///
    /// Always immediately followed by its `TransferIn` partner.
    TransferOut,

    /// Receiver side of a transfer
    TransferIn,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Registration => "registration",
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::TransferIn => "transfer_in",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who opened an account, recorded on its Registration record
///
/// Carrying it in the log is what lets a replay of the log alone rebuild
/// the AccountStore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub identity: Identity,
    pub name: String,
}

/// Immutable history record
///
/// Created by the TransactionLog at the moment the originating operation
/// commits and never mutated or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Commit sequence number, globally unique
    pub sequence: Sequence,

    pub kind: TransactionKind,

    /// Subject account
    pub account_id: AccountId,

    /// Other side of a transfer; `None` for every other kind
    pub counterparty_id: Option<AccountId>,

    /// Sequence of the paired transfer record; `None` for every other kind
    pub linked_sequence: Option<Sequence>,

    /// Zero only for registrations
    pub amount: Amount,

    /// Engine-assigned commit time, non-decreasing across the log
    pub timestamp: DateTime<Utc>,

    /// Present only on registrations
    pub registrant: Option<Registrant>,
}

impl TransactionRecord {
    /// Signed effect of this record on its subject account's balance
    pub fn balance_delta(&self) -> i128 {
        match self.kind {
            TransactionKind::Registration => 0,
            TransactionKind::Deposit | TransactionKind::TransferIn => i128::from(self.amount),
            TransactionKind::Withdrawal | TransactionKind::TransferOut => {
                -i128::from(self.amount)
            }
        }
    }
}

/// Record contents before the log stamps a sequence and timestamp on them
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordDraft {
    pub kind: TransactionKind,
    pub account_id: AccountId,
    pub amount: Amount,
    pub registrant: Option<Registrant>,
}

impl RecordDraft {
    pub(crate) fn registration(account_id: AccountId, registrant: Registrant) -> Self {
        RecordDraft {
            kind: TransactionKind::Registration,
            account_id,
            amount: 0,
            registrant: Some(registrant),
        }
    }

    pub(crate) fn deposit(account_id: AccountId, amount: Amount) -> Self {
        RecordDraft {
            kind: TransactionKind::Deposit,
            account_id,
            amount,
            registrant: None,
        }
    }

    pub(crate) fn withdrawal(account_id: AccountId, amount: Amount) -> Self {
        RecordDraft {
            kind: TransactionKind::Withdrawal,
            account_id,
            amount,
            registrant: None,
        }
    }
}

/// Result of a committed deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub account_id: AccountId,
    pub sequence: Sequence,
    /// Balance right after the commit
    pub balance: Amount,
}

/// Result of a committed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub out_sequence: Sequence,
    pub in_sequence: Sequence,
    pub from_balance: Amount,
    pub to_balance: Amount,
}

/// Name and balance of one account, as returned by `check_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerData {
    pub account_id: AccountId,
    pub name: String,
    pub balance: Amount,
}
