//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over the commands of a script file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize rows one at a time,
//! delegating conversion to the csv_format module. The file is never loaded
//! into memory as a whole.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed rows are yielded as `Err` items carrying their line number,
//!   and iteration continues with the next row

use crate::io::csv_format::{convert_command_row, CommandRow};
use crate::types::{LedgerCommand, ProcessingError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// ```no_run
/// use ledger_engine::io::sync_reader::SyncReader;
/// use std::path::Path;
///
/// let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
/// let commands: Vec<_> = reader.filter_map(Result::ok).collect();
/// println!("Parsed {} commands", commands.len());
/// ```
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a command script for streaming
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer
    pub fn new(path: &Path) -> Result<Self, ProcessingError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProcessingError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => e.into(),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<LedgerCommand, ProcessingError>;

    /// Next command, or the reason the next row could not be used
    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = self.reader.deserialize::<CommandRow>();
        let row = rows.next()?;
        self.line_num += 1;
        // +1 for the header row
        let line = self.line_num + 1;

        Some(match row {
            Ok(row) => convert_command_row(row).map_err(|e| match e {
                ProcessingError::Parse { message, .. } => ProcessingError::parse(Some(line), message),
                other => other,
            }),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,identity,name,counterparty,amount\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(rows: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .and_then(|_| file.write_all(rows.as_bytes()))
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(ProcessingError::FileNotFound { .. })));
    }

    #[test]
    fn test_sync_reader_iterates_commands_in_order() {
        let file = create_temp_csv(
            "register,alice,Alice,,\n\
             deposit,alice,,,100\n\
             transfer,alice,,bob,40\n",
        );

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            commands,
            vec![
                LedgerCommand::Register {
                    identity: Identity::new("alice"),
                    name: "Alice".to_string()
                },
                LedgerCommand::Deposit {
                    identity: Identity::new("alice"),
                    amount: 100
                },
                LedgerCommand::Transfer {
                    identity: Identity::new("alice"),
                    to: Identity::new("bob"),
                    amount: 40
                },
            ]
        );
    }

    #[test]
    fn test_sync_reader_accepts_short_rows() {
        let file = create_temp_csv("register,alice,Alice\n");

        let commands: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(commands.len(), 1);
        assert!(commands[0].is_ok());
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "deposit,alice,,,100\n\
             deposit,alice,,,lots\n\
             deposit,alice,,,5\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[2].is_ok());
        // Line 3 because of the header
        assert!(matches!(
            records[1],
            Err(ProcessingError::Parse { line: Some(3), .. })
        ));
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let file = create_temp_csv("  DEPOSIT  ,  alice  ,  ,  ,  100  \n");

        let commands: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(
            commands,
            vec![LedgerCommand::Deposit {
                identity: Identity::new("alice"),
                amount: 100
            }]
        );
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("");
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
