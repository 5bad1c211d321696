//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading of commands from a script for the async strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the csv_format module for row conversion
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LedgerCommands
//!                  ↓
//!           csv_format module
//!           (CommandRow, convert_command_row)
//! ```

use crate::io::csv_format::{convert_command_row, CommandRow};
use crate::types::LedgerCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Malformed rows are logged and skipped; `skipped()` reports how many.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` commands
    ///
    /// Returns an empty vector once the end of the input is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<CommandRow>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match row.map_err(|e| e.to_string()).and_then(|row| {
                convert_command_row(row).map_err(|e| e.to_string())
            }) {
                Ok(command) => batch.push(command),
                Err(message) => {
                    self.skipped += 1;
                    warn!(line, error = %message, "skipping malformed row");
                }
            }
        }

        batch
    }

    /// Number of malformed rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;
    use futures::io::Cursor;

    const HEADER: &str = "op,identity,name,counterparty,amount\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    fn deposit(identity: &str, amount: u64) -> LedgerCommand {
        LedgerCommand::Deposit {
            identity: Identity::new(identity),
            amount,
        }
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let mut reader = reader(
            "deposit,a,,,1\n\
             deposit,a,,,2\n\
             deposit,a,,,3\n\
             deposit,a,,,4\n\
             deposit,a,,,5\n",
        );

        assert_eq!(reader.read_batch(2).await, vec![deposit("a", 1), deposit("a", 2)]);
        assert_eq!(reader.read_batch(2).await, vec![deposit("a", 3), deposit("a", 4)]);
        assert_eq!(reader.read_batch(2).await, vec![deposit("a", 5)]);
        assert!(reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut reader = reader("");
        assert!(reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let mut reader = reader(
            "refund,a,,,1\n\
             deposit,a,,,2\n\
             deposit,b,,,-3\n",
        );

        let batch = reader.read_batch(10).await;

        assert_eq!(batch, vec![deposit("a", 2)]);
        assert_eq!(reader.skipped(), 2);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_and_case() {
        let mut reader = reader("  Transfer , a ,  , b , 40 \n");

        let batch = reader.read_batch(10).await;

        assert_eq!(
            batch,
            vec![LedgerCommand::Transfer {
                identity: Identity::new("a"),
                to: Identity::new("b"),
                amount: 40,
            }]
        );
    }
}
