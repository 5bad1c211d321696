//! Journal export and import
//!
//! A journal is the full TransactionLog written as CSV, one record per row in
//! sequence order:
//!
//! ```text
//! sequence,kind,account,counterparty,linked_sequence,amount,timestamp,identity,name
//! 1,registration,1,,,0,2024-05-01T09:00:00Z,0xa,Alice
//! 2,deposit,1,,,100,2024-05-01T09:00:01Z,,
//! ```
//!
//! Unlike command scripts, a journal is all-or-nothing: any malformed row
//! fails the whole read. Fields are read verbatim, without trimming.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountId, Amount, Identity, ProcessingError, Registrant, Sequence, TransactionKind,
    TransactionRecord,
};

/// Flat CSV shape of a TransactionRecord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRow {
    pub sequence: Sequence,
    pub kind: TransactionKind,
    pub account: AccountId,
    pub counterparty: Option<AccountId>,
    pub linked_sequence: Option<Sequence>,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub identity: Option<Identity>,
    pub name: Option<String>,
}

impl From<&TransactionRecord> for JournalRow {
    fn from(record: &TransactionRecord) -> Self {
        let (identity, name) = match &record.registrant {
            Some(registrant) => (Some(registrant.identity.clone()), Some(registrant.name.clone())),
            None => (None, None),
        };
        JournalRow {
            sequence: record.sequence,
            kind: record.kind,
            account: record.account_id,
            counterparty: record.counterparty_id,
            linked_sequence: record.linked_sequence,
            amount: record.amount,
            timestamp: record.timestamp,
            identity,
            name,
        }
    }
}

impl JournalRow {
    /// Rebuild the record; registrations need both identity and name
    pub fn into_record(self) -> Result<TransactionRecord, ProcessingError> {
        let registrant = match (self.kind, self.identity, self.name) {
            (TransactionKind::Registration, Some(identity), Some(name)) => {
                Some(Registrant { identity, name })
            }
            (TransactionKind::Registration, _, _) => {
                return Err(ProcessingError::parse(
                    None,
                    format!("registration {} has no identity or name", self.sequence),
                ))
            }
            _ => None,
        };

        Ok(TransactionRecord {
            sequence: self.sequence,
            kind: self.kind,
            account_id: self.account,
            counterparty_id: self.counterparty,
            linked_sequence: self.linked_sequence,
            amount: self.amount,
            timestamp: self.timestamp,
            registrant,
        })
    }
}

/// Write records as a journal, in the order given
pub fn write_journal_csv(
    records: &[Arc<TransactionRecord>],
    output: &mut dyn Write,
) -> Result<(), ProcessingError> {
    let mut writer = csv::Writer::from_writer(output);
    for record in records {
        writer.serialize(JournalRow::from(record.as_ref()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a journal
///
/// Stops at the first malformed row.
pub fn read_journal_csv<R: Read>(input: R) -> Result<Vec<TransactionRecord>, ProcessingError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::None)
        .from_reader(input);

    reader
        .deserialize::<JournalRow>()
        .map(|row| row.map_err(ProcessingError::from)?.into_record())
        .collect()
}

/// Open and parse a journal file
pub fn load_journal(path: &Path) -> Result<Vec<TransactionRecord>, ProcessingError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProcessingError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => e.into(),
    })?;
    read_journal_csv(file)
}
