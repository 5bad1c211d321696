//! Ledger Engine Library
//! # Overview
//!
//! This library provides a concurrent in-memory ledger of customer accounts with
//! an append-only transaction history, plus a CSV batch driver with a sync and
//! an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, TransactionRecord, errors, etc.)
//! - [`core`] - Business logic components:
//!   - [`core::account_store`] - Account records, identity index, per-account locks
//!   - [`core::transaction_log`] - Append-only, gap-free history
//!   - [`core::engine`] - The only mutator; atomic operations and journal replay
//!   - [`core::query`] - Read-only views, snapshots and reconciliation
//! - [`io`] - Command-script reading, account output, journal export/import
//! - [`strategy`] - Sync and async script processing
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - tracing initialization
//!
//! # Operations
//!
//! - **Register**: open a zero-balance account for an identity
//! - **Deposit**: credit funds from outside the ledger
//! - **Withdraw**: debit funds, never below zero
//! - **Transfer**: move funds between two accounts as a single unit
//! - **Check data / check history**: read name, balance and ordered history
//!
//! # Invariants
//!
//! - Balances are never negative
//! - Every committed change has exactly one history record (two, linked, for a transfer)
//! - The sum of all balances equals deposits minus withdrawals
//! - Sequence numbers are unique, gap-free and follow commit order

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{Ledger, LedgerEngine, QueryService};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, Amount, CustomerData, Identity, LedgerCommand, LedgerError, Outcome,
    ProcessingError, Receipt, Sequence, TransactionKind, TransactionRecord, TransferReceipt,
};
