//! Error types for the ledger engine
//!
//! This module defines all error types that can occur while operating the ledger.
//! Errors carry structured context (kind plus the offending account or amount) so
//! that callers can decide whether to retry, abort, or surface them to a user.
//!
//! # Error Categories
//!
//! - **Ledger Errors** (`LedgerError`): rejected operations. None of them leave
//!   any trace in the AccountStore or the TransactionLog.
//! - **Processing Errors** (`ProcessingError`): failures of the batch driver
//!   around the engine (file I/O, CSV parsing, runtime setup).

use super::account::{AccountId, Amount, Identity};
use super::transaction::Sequence;
use thiserror::Error;

/// Error type for rejected ledger operations
///
/// All variants are detected synchronously and are non-retryable by the
/// engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No account with the given id exists
    #[error("Unknown account {account}")]
    UnknownAccount {
        /// The account id that was not found
        account: AccountId,
    },

    /// No account is registered for the given identity
    #[error("No account registered for identity '{identity}'")]
    UnknownIdentity {
        /// The identity that was not found
        identity: Identity,
    },

    /// The identity already owns an account
    #[error("Identity '{identity}' is already registered as account {account}")]
    DuplicateRegistration {
        /// The identity attempting to register again
        identity: Identity,
        /// The account it already owns
        account: AccountId,
    },

    /// Identity is empty or padded with whitespace
    #[error("Invalid identity '{identity}'")]
    InvalidIdentity {
        /// The rejected identity as supplied
        identity: Identity,
    },

    /// Registration name is empty
    #[error("Invalid customer name '{name}'")]
    InvalidName {
        /// The rejected name as supplied
        name: String,
    },

    /// Amount is zero
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// Operation that was rejected
        operation: String,
        /// The rejected amount
        amount: Amount,
    },

    /// Debit exceeds the current balance
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account that would go negative
        account: AccountId,
        /// Balance at the time of the attempt
        balance: Amount,
        /// Requested debit
        requested: Amount,
    },

    /// Transfer names the same account on both sides
    #[error("Cannot transfer from account {account} to itself")]
    SameAccountTransfer {
        /// The account named twice
        account: AccountId,
    },

    /// Checked balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account whose balance would overflow
        account: AccountId,
    },

    /// A journal being replayed or reconciled is inconsistent
    #[error("Corrupt journal at sequence {sequence}: {reason}")]
    CorruptJournal {
        /// First offending sequence number
        sequence: Sequence,
        /// What was wrong with it
        reason: String,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an UnknownAccount error
    pub fn unknown_account(account: AccountId) -> Self {
        LedgerError::UnknownAccount { account }
    }

    /// Create an UnknownIdentity error
    pub fn unknown_identity(identity: &Identity) -> Self {
        LedgerError::UnknownIdentity {
            identity: identity.clone(),
        }
    }

    /// Create a DuplicateRegistration error
    pub fn duplicate_registration(identity: &Identity, account: AccountId) -> Self {
        LedgerError::DuplicateRegistration {
            identity: identity.clone(),
            account,
        }
    }

    /// Create an InvalidIdentity error
    pub fn invalid_identity(identity: &Identity) -> Self {
        LedgerError::InvalidIdentity {
            identity: identity.clone(),
        }
    }

    /// Create an InvalidName error
    pub fn invalid_name(name: &str) -> Self {
        LedgerError::InvalidName {
            name: name.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(operation: &str, amount: Amount) -> Self {
        LedgerError::InvalidAmount {
            operation: operation.to_string(),
            amount,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Amount, requested: Amount) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a SameAccountTransfer error
    pub fn same_account_transfer(account: AccountId) -> Self {
        LedgerError::SameAccountTransfer { account }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a CorruptJournal error
    pub fn corrupt_journal(sequence: Sequence, reason: impl Into<String>) -> Self {
        LedgerError::CorruptJournal {
            sequence,
            reason: reason.into(),
        }
    }
}

/// Error type for the batch driver around the engine
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// File not found at the specified path
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable for command scripts (the row is skipped), fatal for journals.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Async runtime could not be created
    #[error("Runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure
        message: String,
    },

    /// The ledger rejected a journal replay
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ProcessingError {
    /// Create a Parse error
    pub fn parse(line: Option<u64>, message: impl Into<String>) -> Self {
        ProcessingError::Parse {
            line,
            message: message.into(),
        }
    }
}

// Conversion from io::Error to ProcessingError
impl From<std::io::Error> for ProcessingError {
    fn from(error: std::io::Error) -> Self {
        ProcessingError::Io {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to ProcessingError
impl From<csv::Error> for ProcessingError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        ProcessingError::Parse {
            line,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unknown_account(
        LedgerError::UnknownAccount { account: AccountId(42) },
        "Unknown account 42"
    )]
    #[case::unknown_identity(
        LedgerError::UnknownIdentity { identity: Identity::new("0xdead") },
        "No account registered for identity '0xdead'"
    )]
    #[case::duplicate_registration(
        LedgerError::DuplicateRegistration { identity: Identity::new("0xbeef"), account: AccountId(3) },
        "Identity '0xbeef' is already registered as account 3"
    )]
    #[case::invalid_name(
        LedgerError::InvalidName { name: "  ".to_string() },
        "Invalid customer name '  '"
    )]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { operation: "deposit".to_string(), amount: 0 },
        "Invalid amount 0 for deposit"
    )]
    #[case::insufficient_funds(
        LedgerError::InsufficientFunds { account: AccountId(1), balance: 60, requested: 61 },
        "Insufficient funds in account 1: balance 60, requested 61"
    )]
    #[case::same_account_transfer(
        LedgerError::SameAccountTransfer { account: AccountId(5) },
        "Cannot transfer from account 5 to itself"
    )]
    #[case::arithmetic_overflow(
        LedgerError::ArithmeticOverflow { operation: "deposit".to_string(), account: AccountId(1) },
        "Arithmetic overflow in deposit for account 1"
    )]
    #[case::corrupt_journal(
        LedgerError::CorruptJournal { sequence: Sequence(9), reason: "gap".to_string() },
        "Corrupt journal at sequence 9: gap"
    )]
    fn test_ledger_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(AccountId(1), 5, 10),
        LedgerError::InsufficientFunds { account: AccountId(1), balance: 5, requested: 10 }
    )]
    #[case::invalid_amount(
        LedgerError::invalid_amount("withdraw", 0),
        LedgerError::InvalidAmount { operation: "withdraw".to_string(), amount: 0 }
    )]
    #[case::duplicate_registration(
        LedgerError::duplicate_registration(&Identity::new("a"), AccountId(2)),
        LedgerError::DuplicateRegistration { identity: Identity::new("a"), account: AccountId(2) }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case::parse_with_line(ProcessingError::parse(Some(4), "bad op"), "CSV parse error at line 4: bad op")]
    #[case::parse_without_line(ProcessingError::parse(None, "bad op"), "CSV parse error: bad op")]
    #[case::file_not_found(
        ProcessingError::FileNotFound { path: "commands.csv".to_string() },
        "File not found: commands.csv"
    )]
    fn test_processing_error_display(#[case] error: ProcessingError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: ProcessingError = io_error.into();
        assert!(matches!(error, ProcessingError::Io { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }

    #[test]
    fn test_ledger_error_is_transparent_inside_processing_error() {
        let error: ProcessingError = LedgerError::unknown_account(AccountId(3)).into();
        assert_eq!(error.to_string(), "Unknown account 3");
    }
}
