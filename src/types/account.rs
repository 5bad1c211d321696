//! Account-related types for the ledger engine
//!
//! This module defines the Account structure, its identifiers, and the
//! balance arithmetic applied to it while it is held under its lock.

use super::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in the ledger's smallest indivisible unit
pub type Amount = u64;

/// Opaque account identifier
///
/// Assigned by the AccountStore at registration and stable for the account's
/// lifetime. The ordering of identifiers is the total order used when an
/// operation has to lock more than one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity supplied by the external request layer
///
/// The ledger never authenticates an identity; it only enforces that one
/// identity owns at most one account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Identity(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty and free of leading or trailing whitespace
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Identity::new(value)
    }
}

/// Customer account state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identifier assigned at registration
    pub id: AccountId,

    /// Identity that registered the account
    pub identity: Identity,

    /// Display name, set once at registration
    pub name: String,

    /// Current balance, never negative by construction
    pub balance: Amount,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(id: AccountId, identity: Identity, name: impl Into<String>) -> Self {
        Account {
            id,
            identity,
            name: name.into(),
            balance: 0,
        }
    }

    /// Credit funds to the account
    ///
    /// Uses checked arithmetic; on overflow the balance is left untouched.
    ///
    /// # Returns
    ///
    /// The balance after the credit
    pub(crate) fn credit(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance = self.credited(amount)?;
        Ok(self.balance)
    }

    /// Debit funds from the account
    ///
    /// Fails with `InsufficientFunds` when `amount > balance`, leaving the
    /// balance untouched.
    ///
    /// # Returns
    ///
    /// The balance after the debit
    pub(crate) fn debit(&mut self, amount: Amount) -> Result<Amount, LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::insufficient_funds(self.id, self.balance, amount));
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Balance a credit of `amount` would produce, without applying it
    pub(crate) fn credited(&self, amount: Amount) -> Result<Amount, LedgerError> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: Amount) -> Account {
        let mut account = Account::new(AccountId(7), Identity::new("0xabc"), "Naruto");
        account.balance = balance;
        account
    }

    #[test]
    fn test_new_account_has_zero_balance() {
        let account = Account::new(AccountId(1), Identity::new("0x1"), "Hinata");
        assert_eq!(account.balance, 0);
        assert_eq!(account.name, "Hinata");
        assert_eq!(account.identity.as_str(), "0x1");
    }

    #[test]
    fn test_debit_exact_balance_empties_account() {
        let mut account = account(100);
        assert_eq!(account.debit(100), Ok(0));
        assert_eq!(account.balance, 0);
    }

    #[test]
    fn test_debit_more_than_balance_leaves_balance_unchanged() {
        let mut account = account(100);
        let err = account.debit(101).unwrap_err();
        assert_eq!(err, LedgerError::insufficient_funds(AccountId(7), 100, 101));
        assert_eq!(account.balance, 100);
    }

    #[test]
    fn test_credit_overflow_is_rejected() {
        let mut account = account(u64::MAX);
        let err = account.credit(1).unwrap_err();
        assert!(matches!(err, LedgerError::ArithmeticOverflow { .. }));
        assert_eq!(account.balance, u64::MAX);
    }

    #[test]
    fn test_account_ids_order_numerically() {
        let mut ids = vec![AccountId(10), AccountId(2), AccountId(7)];
        ids.sort();
        assert_eq!(ids, vec![AccountId(2), AccountId(7), AccountId(10)]);
    }
}
