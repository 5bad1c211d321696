//! Account storage with per-account locking
//!
//! This module provides the `AccountStore`, which owns the mapping from
//! account identifier to account record and the one-account-per-identity
//! index.
//!
//! # Design
//!
//! Accounts live in a `DashMap` (a concurrent HashMap) of `Arc<Mutex<Account>>`.
//! The map shard lock is only held long enough to clone the handle out; the
//! account's own mutex is what serializes operations on it. This allows:
//! - Operations on disjoint accounts to run in parallel
//! - A transfer to hold two accounts at once, which a DashMap entry guard
//!   cannot do safely when both keys land in the same shard
//!
//! # Lock Ordering
//!
//! Whenever more than one account is locked, the locks are taken in ascending
//! `AccountId` order, never in call order. Every multi-account path in this
//! module follows that rule, so two transfers moving funds in opposite
//! directions between the same pair of accounts cannot deadlock.

use crate::types::{Account, AccountId, Amount, Identity, LedgerError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

type AccountHandle = Arc<Mutex<Account>>;

/// Thread-safe account store
///
/// Accounts are created by `register` and never removed.
#[derive(Debug)]
pub struct AccountStore {
    /// Account records by id
    accounts: DashMap<AccountId, AccountHandle>,

    /// Account owned by each registered identity
    identities: DashMap<Identity, AccountId>,

    /// Next identifier to hand out
    next_id: AtomicU64,
}

impl AccountStore {
    /// Create an empty AccountStore
    ///
    /// Identifiers are handed out starting at 1.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            identities: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new account for `identity`
    ///
    /// The identity must be non-empty and unpadded, since it is stored and
    /// journaled verbatim. The name is trimmed; an empty result is rejected.
    /// The `commit` closure
    /// receives the fully built account before it becomes visible to any other
    /// operation, and runs while the identity slot is still reserved. The
    /// engine uses it to append the Registration record, so no reader can see
    /// the account without its Registration.
    ///
    /// # Returns
    ///
    /// * `Ok(AccountId)` - The identifier of the new account (balance 0)
    /// * `Err(LedgerError::InvalidIdentity)` - The identity is empty or padded
    /// * `Err(LedgerError::InvalidName)` - The name is empty
    /// * `Err(LedgerError::DuplicateRegistration)` - The identity already owns an account
    pub fn register<F>(
        &self,
        identity: &Identity,
        name: &str,
        commit: F,
    ) -> Result<AccountId, LedgerError>
    where
        F: FnOnce(&Account),
    {
        if !identity.is_well_formed() {
            return Err(LedgerError::invalid_identity(identity));
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::invalid_name(name));
        }

        match self.identities.entry(identity.clone()) {
            Entry::Occupied(existing) => Err(LedgerError::duplicate_registration(
                identity,
                *existing.get(),
            )),
            Entry::Vacant(slot) => {
                let id = AccountId(self.next_id.fetch_add(1, Ordering::SeqCst));
                let account = Account::new(id, identity.clone(), trimmed);
                commit(&account);
                self.accounts.insert(id, Arc::new(Mutex::new(account)));
                slot.insert(id);
                Ok(id)
            }
        }
    }

    /// Re-create an account read back from a journal
    ///
    /// Keeps the recorded identifier and advances the id counter past it.
    /// The caller checks that the identifier is not already taken.
    pub(crate) fn restore(&self, account: Account) -> Result<(), LedgerError> {
        let id = account.id;
        match self.identities.entry(account.identity.clone()) {
            Entry::Occupied(existing) => Err(LedgerError::duplicate_registration(
                &account.identity,
                *existing.get(),
            )),
            Entry::Vacant(slot) => {
                self.accounts.insert(id, Arc::new(Mutex::new(account)));
                slot.insert(id);
                self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    /// Get the current balance of an account
    pub fn get_balance(&self, id: AccountId) -> Result<Amount, LedgerError> {
        self.read(id, |account| account.balance)
    }

    /// Clone of the account record
    pub fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.read(id, Account::clone)
    }

    /// Run `f` against one account while holding its lock
    ///
    /// Anything `f` observes elsewhere (the history, for instance) is
    /// consistent with the balance it sees.
    pub fn read<F, T>(&self, id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&Account) -> T,
    {
        let handle = self.handle(id)?;
        let account = handle.lock();
        Ok(f(&account))
    }

    /// Account owned by `identity`
    pub fn account_of(&self, identity: &Identity) -> Result<AccountId, LedgerError> {
        self.identities
            .get(identity)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::unknown_identity(identity))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Run `f` with exclusive access to one account
    ///
    /// The account stays locked for the whole closure, so everything the
    /// closure does (balance change plus history append) is a single atomic
    /// step for every other caller. Credits and debits are only ever applied
    /// from inside such a closure.
    pub fn update<F, T>(&self, id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        let handle = self.handle(id)?;
        let mut account = handle.lock();
        f(&mut *account)
    }

    /// Run `f` with exclusive access to two distinct accounts
    ///
    /// Locks are acquired in ascending id order regardless of argument order;
    /// the closure always receives `(first, second)` as passed in.
    pub fn update_pair<F, T>(
        &self,
        first: AccountId,
        second: AccountId,
        f: F,
    ) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account, &mut Account) -> Result<T, LedgerError>,
    {
        if first == second {
            return Err(LedgerError::same_account_transfer(first));
        }

        let first_handle = self.handle(first)?;
        let second_handle = self.handle(second)?;

        if first < second {
            let mut a = first_handle.lock();
            let mut b = second_handle.lock();
            f(&mut *a, &mut *b)
        } else {
            let mut b = second_handle.lock();
            let mut a = first_handle.lock();
            f(&mut *a, &mut *b)
        }
    }

    /// Lock every account, in ascending id order
    ///
    /// While `f` runs no operation can commit against any of these accounts,
    /// which makes the set a consistent snapshot. Accounts are never removed,
    /// so a matching count after locking means no account was registered in
    /// between. Otherwise the pass is retried, since such an account could
    /// already hold one side of a transfer.
    pub(crate) fn with_all_locked<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&[MutexGuard<'_, Account>]) -> T,
    {
        loop {
            let mut handles: Vec<(AccountId, AccountHandle)> = self
                .accounts
                .iter()
                .map(|entry| (*entry.key(), Arc::clone(entry.value())))
                .collect();
            handles.sort_by_key(|(id, _)| *id);

            let guards: Vec<MutexGuard<'_, Account>> =
                handles.iter().map(|(_, handle)| handle.lock()).collect();
            if guards.len() == self.accounts.len() {
                return f(&guards);
            }
            trace!(locked = guards.len(), "account set changed while locking, retrying");
        }
    }

    fn handle(&self, id: AccountId) -> Result<AccountHandle, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::unknown_account(id))
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
