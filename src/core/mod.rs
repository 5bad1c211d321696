//! Core business logic module
//!
//! This module contains the ledger components:
//! - `account_store` - Account records and the identity index
//! - `transaction_log` - Append-only history of committed operations
//! - `engine` - The only mutator; applies operations atomically
//! - `query` - Read-only views, snapshots and reconciliation
//! - `traits` - The `Ledger` call/response contract
//! - `batch_processor` - Concurrent application of command batches

pub mod account_store;
pub mod batch_processor;
pub mod engine;
pub mod query;
pub mod traits;
pub mod transaction_log;

pub use account_store::AccountStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::LedgerEngine;
pub use query::{QueryService, ReconciliationReport};
pub use traits::Ledger;
pub use transaction_log::{History, HistoryIter, TransactionLog};
