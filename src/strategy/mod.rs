//! Processing strategy module for command scripts
//!
//! This module defines the Strategy pattern for applying a whole command script
//! to a ledger: CSV reading plus engine calls. Different implementations
//! (synchronous, asynchronous batch) can be selected at runtime and must leave
//! the ledger with the same final balances.

use crate::cli::StrategyType;
use crate::core::LedgerEngine;
use crate::types::{LedgerError, Outcome, ProcessingError};
use std::path::Path;
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Counts of what happened to the rows of a script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    /// Commands the ledger committed
    pub applied: usize,

    /// Commands the ledger rejected
    pub rejected: usize,

    /// Rows that could not be parsed into a command
    pub malformed: usize,
}

impl ProcessingSummary {
    pub(crate) fn record(&mut self, result: &Result<Outcome, LedgerError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// Processing strategy trait for command scripts
pub trait ProcessingStrategy: Send + Sync {
    /// Apply every command in `input_path` to `engine`
    ///
    /// # Errors
    ///
    /// Only fatal problems are returned: the input cannot be opened or read,
    /// or the async runtime cannot be built. Malformed rows and rejected
    /// commands are logged with `warn!`, counted in the summary, and skipped.
    fn process(
        &self,
        engine: Arc<LedgerEngine>,
        input_path: &Path,
    ) -> Result<ProcessingSummary, ProcessingError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` is ignored by the sync strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
