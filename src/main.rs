//! Ledger engine CLI
//!
//! Applies a command script to a ledger and prints the resulting accounts.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > accounts.csv
//! cargo run -- --strategy sync commands.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 commands.csv > accounts.csv
//! cargo run -- --restore yesterday.csv --journal today.csv commands.csv > accounts.csv
//! ```
//!
//! The accounts CSV (`identity,name,balance`) goes to stdout; logs go to
//! stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (rejected commands and malformed rows do not count as failure)
//! - 1: Fatal error (file not found, unreadable input, corrupt journal, etc.)

use ledger_engine::cli::{self, CliArgs, StrategyType};
use ledger_engine::core::LedgerEngine;
use ledger_engine::io::{load_journal, write_accounts_csv, write_journal_csv};
use ledger_engine::types::ProcessingError;
use ledger_engine::{logging, strategy};
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::sync::Arc;
use tracing::info;

fn main() {
    let args = cli::parse_args();
    logging::init(&args.log_level);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), ProcessingError> {
    let engine = match &args.restore {
        Some(path) => {
            let records = load_journal(path)?;
            let engine = LedgerEngine::from_journal(records)?;
            info!(journal = %path.display(), "ledger restored");
            engine
        }
        None => LedgerEngine::new(),
    };
    let engine = Arc::new(engine);

    let config = (args.strategy == StrategyType::Async).then(|| args.to_batch_config());
    let strategy = strategy::create_strategy(args.strategy, config);
    strategy.process(Arc::clone(&engine), &args.input_file)?;

    let query = engine.query();
    let mut stdout = std::io::stdout().lock();
    write_accounts_csv(&query.accounts(), &mut stdout)?;

    if let Some(path) = &args.journal {
        let mut output = BufWriter::new(File::create(path)?);
        write_journal_csv(&query.journal(), &mut output)?;
        info!(journal = %path.display(), records = query.journal().len(), "journal written");
    }

    Ok(())
}
