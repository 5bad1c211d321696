//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - Command-script rows and account output
//! - `sync_reader` - Synchronous command reader with iterator interface
//! - `async_reader` - Asynchronous command reader with batch reading interface
//! - `journal` - Full TransactionLog export and import

pub mod async_reader;
pub mod csv_format;
pub mod journal;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_command_row, write_accounts_csv, CommandRow};
pub use journal::{load_journal, read_journal_csv, write_journal_csv, JournalRow};
pub use sync_reader::SyncReader;
