//! Benchmark suite for comparing processing strategies
//!
//! Compares the sync and async strategies on generated command scripts using
//! the divan benchmarking framework.
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Each script registers `customers` accounts, funds them, then issues a mix
//! of deposits, withdrawals and transfers between neighbouring customers.

use ledger_engine::cli::StrategyType;
use ledger_engine::core::LedgerEngine;
use ledger_engine::strategy::{create_strategy, BatchConfig};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn main() {
    divan::main();
}

const SIZES: &[usize] = &[1_000, 10_000, 100_000];

fn script(commands: usize) -> NamedTempFile {
    let customers = (commands / 20).max(2);
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    let mut body = String::from("op,identity,name,counterparty,amount\n");

    for c in 0..customers {
        body.push_str(&format!("register,c{c},Customer {c},,\ndeposit,c{c},,,1000\n"));
    }
    for i in 0..commands {
        let c = i % customers;
        let line = match i % 4 {
            0 => format!("deposit,c{c},,,{}\n", i % 90 + 1),
            1 => format!("withdraw,c{c},,,{}\n", i % 70 + 1),
            _ => format!("transfer,c{c},,c{},{}\n", (c + 1) % customers, i % 50 + 1),
        };
        body.push_str(&line);
    }

    file.write_all(body.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn run(strategy_type: StrategyType, bencher: divan::Bencher, commands: usize) {
    let input = script(commands);
    let strategy = create_strategy(strategy_type, Some(BatchConfig::default()));

    bencher.bench_local(|| {
        strategy
            .process(Arc::new(LedgerEngine::new()), input.path())
            .expect("Processing failed")
    });
}

#[divan::bench(args = SIZES)]
fn sync_strategy(bencher: divan::Bencher, commands: usize) {
    run(StrategyType::Sync, bencher, commands);
}

#[divan::bench(args = SIZES)]
fn async_strategy(bencher: divan::Bencher, commands: usize) {
    run(StrategyType::Async, bencher, commands);
}
