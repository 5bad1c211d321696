//! Asynchronous batch processing strategy
//!
//! Applies a command script in batches on a multi-threaded tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (identity partitioning + tokio tasks)
//!         └── Arc<LedgerEngine>
//! ```
//!
//! # Ordering
//!
//! - Batches are applied one after another, so a batch only starts once every
//!   command of the previous one has committed
//! - Within a batch, groups of commands with disjoint identities run in parallel
//! - Commands touching the same identity keep file order
//!
//! Together these give the same final balances as the sync strategy.

use crate::core::{BatchProcessor, LedgerEngine};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, ProcessingSummary};
use crate::types::ProcessingError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of commands per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        engine: Arc<LedgerEngine>,
        input_path: &Path,
    ) -> Result<ProcessingSummary, ProcessingError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| ProcessingError::Runtime {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let processor = BatchProcessor::new(engine);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => ProcessingError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => e.into(),
                })?;

            // csv-async reads futures::io, tokio files need the compat layer
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = ProcessingSummary::default();
            let mut batches = 0usize;

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                batches += 1;
                debug!(batch = batches, commands = batch.len(), "applying batch");
                for result in processor.process_batch(batch).await {
                    summary.record(&result.result);
                }
            }

            summary.malformed = reader.skipped();
            info!(
                batches,
                applied = summary.applied,
                rejected = summary.rejected,
                malformed = summary.malformed,
                "script processed"
            );
            Ok::<_, ProcessingError>(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ledger;
    use crate::types::Identity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn balance_of(engine: &LedgerEngine, identity: &str) -> u64 {
        let account = engine.account_of(&Identity::new(identity)).unwrap();
        engine.check_data(account).unwrap().balance
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.max_concurrent_batches, num_cpus::get());
    }

    #[test]
    fn test_async_strategy_maintains_ordering_across_batches() {
        // Small batches force a single identity's commands across several batches
        let file = create_temp_csv(
            "op,identity,name,counterparty,amount\n\
             register,a,A,,\n\
             register,b,B,,\n\
             deposit,a,,,100\n\
             deposit,b,,,50\n\
             withdraw,a,,,30\n\
             transfer,b,,a,25\n\
             withdraw,a,,,95\n",
        );
        let engine = Arc::new(LedgerEngine::new());
        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(2, 4));

        let summary = strategy.process(Arc::clone(&engine), file.path()).unwrap();

        assert_eq!(summary.applied, 7);
        assert_eq!(balance_of(&engine, "a"), 0);
        assert_eq!(balance_of(&engine, "b"), 25);
    }

    #[test]
    fn test_async_strategy_counts_malformed_rows() {
        let file = create_temp_csv(
            "op,identity,name,counterparty,amount\n\
             register,a,A,,\n\
             deposit,a,,,x\n\
             deposit,a,,,0\n",
        );
        let engine = Arc::new(LedgerEngine::new());

        let summary = AsyncProcessingStrategy::new(BatchConfig::default())
            .process(engine, file.path())
            .unwrap();

        assert_eq!(
            summary,
            ProcessingSummary {
                applied: 1,
                rejected: 1,
                malformed: 1,
            }
        );
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let strategy = AsyncProcessingStrategy::new(BatchConfig::default());
        let result = strategy.process(Arc::new(LedgerEngine::new()), Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    }
}
