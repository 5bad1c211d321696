//! Read-only views over committed ledger state
//!
//! `QueryService` answers balance, account and history questions without ever
//! mutating anything. Every answer reflects only committed operations: reads
//! take the same per-account locks the engine writes under, so no reader can
//! observe half of a transfer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::account_store::AccountStore;
use crate::core::transaction_log::{History, TransactionLog};
use crate::types::{
    Account, AccountId, Amount, CustomerData, Identity, LedgerError, Sequence, TransactionRecord,
};

/// Outcome of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Accounts checked
    pub accounts: usize,

    /// Log records replayed
    pub records: usize,

    /// Sum of all checked balances
    pub total_balance: u128,
}

/// Read-only view over an AccountStore and its TransactionLog
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<AccountStore>,
    log: TransactionLog,
}

impl QueryService {
    pub(crate) fn new(store: Arc<AccountStore>, log: TransactionLog) -> Self {
        Self { store, log }
    }

    /// Current balance of an account
    pub fn balance(&self, account: AccountId) -> Result<Amount, LedgerError> {
        self.store.get_balance(account)
    }

    /// Name and balance of an account, read together
    pub fn check_data(&self, account: AccountId) -> Result<CustomerData, LedgerError> {
        self.store.read(account, |state| CustomerData {
            account_id: state.id,
            name: state.name.clone(),
            balance: state.balance,
        })
    }

    /// Ordered history of an account
    ///
    /// Captured while the account is locked, so the history ends exactly at the
    /// operation that produced the current balance.
    pub fn check_history(&self, account: AccountId) -> Result<History, LedgerError> {
        self.store
            .read(account, |state| self.log.history_for(state.id))
    }

    /// Account registered for `identity`
    pub fn account_of(&self, identity: &Identity) -> Result<AccountId, LedgerError> {
        self.store.account_of(identity)
    }

    /// Copy of one account record
    pub fn account(&self, account: AccountId) -> Result<Account, LedgerError> {
        self.store.get(account)
    }

    /// Consistent snapshot of every account, in id order
    ///
    /// All accounts are locked at once, so the snapshot never contains one
    /// side of a transfer without the other.
    pub fn accounts(&self) -> Vec<Account> {
        self.store.with_all_locked(|accounts| {
            accounts.iter().map(|account| Account::clone(account)).collect()
        })
    }

    /// Sum of all balances over a consistent snapshot
    pub fn total_balance(&self) -> u128 {
        self.store.with_all_locked(|accounts| {
            accounts
                .iter()
                .map(|account| u128::from(account.balance))
                .sum()
        })
    }

    /// Every committed record, in sequence order
    pub fn journal(&self) -> Vec<Arc<TransactionRecord>> {
        self.log.records()
    }

    /// Check every balance against the log
    ///
    /// With every account locked, the log is replayed per account: the
    /// running balance must never go negative and must end at the stored
    /// balance. Accounts registered after the snapshot was taken are skipped.
    ///
    /// # Errors
    ///
    /// `LedgerError::CorruptJournal` naming the first record (or the last
    /// record of the account) where the log and the store disagree.
    pub fn reconcile(&self) -> Result<ReconciliationReport, LedgerError> {
        self.store.with_all_locked(|accounts| {
            let records = self.log.records();
            let mut running: HashMap<AccountId, (i128, Sequence)> = accounts
                .iter()
                .map(|account| (account.id, (0, Sequence(0))))
                .collect();

            for record in &records {
                let Some((balance, last)) = running.get_mut(&record.account_id) else {
                    continue;
                };
                *balance += record.balance_delta();
                *last = record.sequence;
                if *balance < 0 {
                    return Err(LedgerError::corrupt_journal(
                        record.sequence,
                        format!("account {} goes negative", record.account_id),
                    ));
                }
            }

            let mut total_balance = 0u128;
            for account in accounts {
                let (replayed, last) = running[&account.id];
                if replayed != i128::from(account.balance) {
                    return Err(LedgerError::corrupt_journal(
                        last,
                        format!(
                            "account {} holds {} but its history sums to {}",
                            account.id, account.balance, replayed
                        ),
                    ));
                }
                total_balance += u128::from(account.balance);
            }

            Ok(ReconciliationReport {
                accounts: accounts.len(),
                records: records.len(),
                total_balance,
            })
        })
    }
}
