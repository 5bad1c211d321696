//! Synchronous processing strategy
//!
//! Applies a command script on the calling thread, one command at a time, in
//! file order. This is the reference behavior the async strategy has to match.
//!
//! # Design
//!
//! The SyncProcessingStrategy only orchestrates, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Business rules to `LedgerEngine` through the `Ledger` trait
//!
//! Memory use is O(accounts + log), never O(script): rows are streamed.

use crate::core::{Ledger, LedgerEngine};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ProcessingSummary};
use crate::types::ProcessingError;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous processing strategy
///
/// ```no_run
/// use ledger_engine::core::LedgerEngine;
/// use ledger_engine::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let engine = Arc::new(LedgerEngine::new());
/// let summary = SyncProcessingStrategy
///     .process(Arc::clone(&engine), Path::new("commands.csv"))
///     .expect("Processing failed");
/// println!("{} applied, {} rejected", summary.applied, summary.rejected);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        engine: Arc<LedgerEngine>,
        input_path: &Path,
    ) -> Result<ProcessingSummary, ProcessingError> {
        let reader = SyncReader::new(input_path)?;
        let mut summary = ProcessingSummary::default();

        for row in reader {
            match row {
                Ok(command) => {
                    let result = engine.execute(&command);
                    if let Err(e) = &result {
                        warn!(
                            operation = command.operation(),
                            identity = %command.identity(),
                            error = %e,
                            "command rejected"
                        );
                    }
                    summary.record(&result);
                }
                Err(e) => {
                    summary.malformed += 1;
                    warn!(error = %e, "skipping malformed row");
                }
            }
        }

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "script processed"
        );
        Ok(summary)
    }
}
