//! Core trait for ledger operations
//!
//! This module defines the call/response contract the outer request layer
//! drives. The batch driver and the tests program against `Ledger` rather
//! than a concrete engine.

use crate::core::transaction_log::History;
use crate::types::{
    Account, AccountId, Amount, CustomerData, Identity, LedgerCommand, LedgerError, Outcome,
    Receipt, TransferReceipt,
};

/// Operations offered by a ledger
///
/// Every method is callable concurrently through a shared reference. Each
/// either commits completely or fails without side effects.
pub trait Ledger {
    /// Open an account for `identity` with a zero balance
    fn register_customer(&self, identity: &Identity, name: &str)
        -> Result<AccountId, LedgerError>;

    /// Credit funds from outside the ledger
    fn deposit(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError>;

    /// Debit funds out of the ledger
    fn withdraw(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError>;

    /// Move funds between two accounts atomically
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, LedgerError>;

    /// Name and balance of an account
    fn check_data(&self, account: AccountId) -> Result<CustomerData, LedgerError>;

    /// Ordered history of an account
    fn check_history(&self, account: AccountId) -> Result<History, LedgerError>;

    /// Account registered for an identity
    fn account_of(&self, identity: &Identity) -> Result<AccountId, LedgerError>;

    /// Consistent snapshot of all accounts, in id order
    fn accounts(&self) -> Vec<Account>;

    /// Apply one identity-keyed command
    ///
    /// Identities are resolved to accounts first; an unregistered identity
    /// fails with `UnknownIdentity` before the ledger is touched.
    fn execute(&self, command: &LedgerCommand) -> Result<Outcome, LedgerError> {
        match command {
            LedgerCommand::Register { identity, name } => self
                .register_customer(identity, name)
                .map(Outcome::Registered),
            LedgerCommand::Deposit { identity, amount } => {
                let account = self.account_of(identity)?;
                self.deposit(account, *amount).map(Outcome::Deposited)
            }
            LedgerCommand::Withdraw { identity, amount } => {
                let account = self.account_of(identity)?;
                self.withdraw(account, *amount).map(Outcome::Withdrew)
            }
            LedgerCommand::Transfer {
                identity,
                to,
                amount,
            } => {
                let from = self.account_of(identity)?;
                let to = self.account_of(to)?;
                self.transfer(from, to, *amount).map(Outcome::Transferred)
            }
        }
    }
}
