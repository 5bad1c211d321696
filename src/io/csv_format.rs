//! CSV format handling for command scripts and account output
//!
//! This module centralizes the command-script CSV concerns, providing:
//! - CommandRow structure for deserialization
//! - Conversion from CSV rows to `LedgerCommand`s
//! - Account output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Account, Amount, Identity, LedgerCommand, ProcessingError};
use serde::Deserialize;
use std::io::Write;

/// One row of a command script
///
/// Columns: op, identity, name, counterparty, amount. Only the columns the
/// operation needs have to be filled in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CommandRow {
    pub op: String,
    pub identity: String,
    pub name: Option<String>,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
}

/// Convert a CommandRow to a LedgerCommand
///
/// This function:
/// - Parses the operation name (case-insensitive)
/// - Parses the amount as an unsigned integer in the base unit
/// - Checks that the columns the operation needs are present
///
/// Business rules (zero amounts, empty names) are left to the ledger.
pub fn convert_command_row(row: CommandRow) -> Result<LedgerCommand, ProcessingError> {
    let identity = non_empty(&row.identity)
        .map(Identity::new)
        .ok_or_else(|| ProcessingError::parse(None, format!("'{}' row has no identity", row.op)))?;

    match row.op.to_lowercase().as_str() {
        "register" => Ok(LedgerCommand::Register {
            identity,
            name: row.name.unwrap_or_default(),
        }),
        "deposit" => Ok(LedgerCommand::Deposit {
            amount: parse_amount(&row.op, row.amount.as_deref())?,
            identity,
        }),
        "withdraw" | "withdrawal" => Ok(LedgerCommand::Withdraw {
            amount: parse_amount(&row.op, row.amount.as_deref())?,
            identity,
        }),
        "transfer" => {
            let to = row
                .counterparty
                .as_deref()
                .and_then(non_empty)
                .map(Identity::new)
                .ok_or_else(|| {
                    ProcessingError::parse(
                        None,
                        format!("transfer from '{}' requires a counterparty", identity),
                    )
                })?;
            Ok(LedgerCommand::Transfer {
                amount: parse_amount(&row.op, row.amount.as_deref())?,
                identity,
                to,
            })
        }
        _ => Err(ProcessingError::parse(
            None,
            format!("Invalid operation '{}' for identity {}", row.op, identity),
        )),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn parse_amount(op: &str, amount: Option<&str>) -> Result<Amount, ProcessingError> {
    let text = amount
        .and_then(non_empty)
        .ok_or_else(|| ProcessingError::parse(None, format!("{} requires an amount", op)))?;

    // u64 parsing accepts a leading '+'; signed amounts are malformed either way
    if text.starts_with('+') {
        return Err(ProcessingError::parse(None, format!("Invalid amount '{}'", text)));
    }
    text.parse::<Amount>()
        .map_err(|_| ProcessingError::parse(None, format!("Invalid amount '{}'", text)))
}

/// Write account states to CSV format
///
/// Writes accounts with columns: identity, name, balance.
/// Accounts are sorted by identity for deterministic output.
pub fn write_accounts_csv(
    accounts: &[Account],
    output: &mut dyn Write,
) -> Result<(), ProcessingError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["identity", "name", "balance"])?;

    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.identity.cmp(&b.identity));

    for account in sorted {
        writer.write_record([
            account.identity.as_str(),
            account.name.as_str(),
            account.balance.to_string().as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;
    use rstest::rstest;

    fn row(op: &str, identity: &str, counterparty: Option<&str>, amount: Option<&str>) -> CommandRow {
        CommandRow {
            op: op.to_string(),
            identity: identity.to_string(),
            name: None,
            counterparty: counterparty.map(str::to_string),
            amount: amount.map(str::to_string),
        }
    }

    #[rstest]
    #[case::deposit("deposit", LedgerCommand::Deposit { identity: Identity::new("alice"), amount: 100 })]
    #[case::upper_case("DEPOSIT", LedgerCommand::Deposit { identity: Identity::new("alice"), amount: 100 })]
    #[case::withdraw("withdraw", LedgerCommand::Withdraw { identity: Identity::new("alice"), amount: 100 })]
    #[case::withdrawal("Withdrawal", LedgerCommand::Withdraw { identity: Identity::new("alice"), amount: 100 })]
    fn test_convert_single_account_ops(#[case] op: &str, #[case] expected: LedgerCommand) {
        let result = convert_command_row(row(op, "alice", None, Some("100")));
        assert_eq!(result.unwrap(), expected);
    }

    #[test]
    fn test_convert_register_keeps_name() {
        let mut register = row("register", "alice", None, None);
        register.name = Some("Alice Liddell".to_string());

        let command = convert_command_row(register).unwrap();

        assert_eq!(
            command,
            LedgerCommand::Register {
                identity: Identity::new("alice"),
                name: "Alice Liddell".to_string(),
            }
        );
    }

    #[test]
    fn test_convert_transfer() {
        let command = convert_command_row(row("transfer", "alice", Some("bob"), Some("40"))).unwrap();

        assert_eq!(
            command,
            LedgerCommand::Transfer {
                identity: Identity::new("alice"),
                to: Identity::new("bob"),
                amount: 40,
            }
        );
    }

    #[test]
    fn test_zero_amount_is_left_to_the_ledger() {
        let command = convert_command_row(row("deposit", "alice", None, Some("0"))).unwrap();
        assert_eq!(
            command,
            LedgerCommand::Deposit {
                identity: Identity::new("alice"),
                amount: 0
            }
        );
    }

    #[rstest]
    #[case::invalid_op(row("teleport", "alice", None, Some("1")), "Invalid operation")]
    #[case::missing_identity(row("deposit", "  ", None, Some("1")), "no identity")]
    #[case::missing_amount(row("deposit", "alice", None, None), "requires an amount")]
    #[case::blank_amount(row("withdraw", "alice", None, Some(" ")), "requires an amount")]
    #[case::negative_amount(row("deposit", "alice", None, Some("-5")), "Invalid amount")]
    #[case::signed_amount(row("deposit", "alice", None, Some("+5")), "Invalid amount")]
    #[case::fractional_amount(row("deposit", "alice", None, Some("1.5")), "Invalid amount")]
    #[case::missing_counterparty(row("transfer", "alice", None, Some("1")), "requires a counterparty")]
    fn test_convert_errors(#[case] input: CommandRow, #[case] expected: &str) {
        let error = convert_command_row(input).unwrap_err();
        assert!(error.to_string().contains(expected), "got: {}", error);
    }

    #[rstest]
    #[case::sorted_by_identity(
        vec![
            Account { id: AccountId(1), identity: Identity::new("carol"), name: "Carol".into(), balance: 5 },
            Account { id: AccountId(2), identity: Identity::new("alice"), name: "Alice".into(), balance: 60 },
        ],
        "identity,name,balance\nalice,Alice,60\ncarol,Carol,5\n"
    )]
    #[case::quoted_name(
        vec![Account { id: AccountId(1), identity: Identity::new("a"), name: "Doe, Jane".into(), balance: 0 }],
        "identity,name,balance\na,\"Doe, Jane\",0\n"
    )]
    #[case::empty(vec![], "identity,name,balance\n")]
    fn test_write_accounts_csv(#[case] accounts: Vec<Account>, #[case] expected: &str) {
        let mut output = Vec::new();
        write_accounts_csv(&accounts, &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
