//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account state and identifiers
//! - `transaction`: History records, sequence numbers and receipts
//! - `command`: Requests accepted by the batch driver
//! - `error`: Error types for the ledger and the driver

pub mod account;
pub mod command;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountId, Amount, Identity};
pub use command::{LedgerCommand, Outcome};
pub use error::{LedgerError, ProcessingError};
pub(crate) use transaction::RecordDraft;
pub use transaction::{
    CustomerData, Receipt, Registrant, Sequence, TransactionKind, TransactionRecord,
    TransferReceipt,
};
