//! Request types for the batch driver
//!
//! A `LedgerCommand` is one line of an input script, expressed in terms of
//! caller identities. The request layer resolves identities to account ids
//! before calling into the engine.

use super::account::{AccountId, Amount, Identity};
use super::transaction::{Receipt, TransferReceipt};

/// One request against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    /// Open an account for `identity`
    Register { identity: Identity, name: String },

    /// Credit the caller's account
    Deposit { identity: Identity, amount: Amount },

    /// Debit the caller's account
    Withdraw { identity: Identity, amount: Amount },

    /// Move funds from the caller's account to the counterparty's
    Transfer {
        identity: Identity,
        to: Identity,
        amount: Amount,
    },
}

impl LedgerCommand {
    /// Identity issuing the command
    pub fn identity(&self) -> &Identity {
        match self {
            LedgerCommand::Register { identity, .. }
            | LedgerCommand::Deposit { identity, .. }
            | LedgerCommand::Withdraw { identity, .. }
            | LedgerCommand::Transfer { identity, .. } => identity,
        }
    }

    /// Receiving identity, for transfers
    pub fn counterparty(&self) -> Option<&Identity> {
        match self {
            LedgerCommand::Transfer { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Short operation name used in logs
    pub fn operation(&self) -> &'static str {
        match self {
            LedgerCommand::Register { .. } => "register",
            LedgerCommand::Deposit { .. } => "deposit",
            LedgerCommand::Withdraw { .. } => "withdraw",
            LedgerCommand::Transfer { .. } => "transfer",
        }
    }
}

/// Successful result of applying a `LedgerCommand`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Registered(AccountId),
    Deposited(Receipt),
    Withdrew(Receipt),
    Transferred(TransferReceipt),
}
