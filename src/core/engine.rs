//! Ledger engine
//!
//! This module provides the `LedgerEngine` that orchestrates registration,
//! deposits, withdrawals and transfers by coordinating the AccountStore and
//! the TransactionLog.
//!
//! The engine is the only component that mutates either of them. Every public
//! operation is one atomic step: the balance change and its history record
//! are both applied while the affected accounts are locked, and every failure
//! is detected before anything is written.
//!
//! The engine enforces business rules such as:
//! - Amounts must be strictly positive
//! - Balances never go negative
//! - One account per identity, with a non-empty name
//! - Transfers need two distinct existing accounts and move funds as a unit

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::account_store::AccountStore;
use crate::core::query::QueryService;
use crate::core::traits::Ledger;
use crate::core::transaction_log::{History, TransactionLog};
use crate::types::{
    Account, AccountId, Amount, CustomerData, Identity, LedgerError, Receipt, RecordDraft,
    Registrant, Sequence, TransactionKind, TransactionRecord, TransferReceipt,
};

/// Ledger engine
///
/// Cheap to share behind an `Arc`; all operations take `&self` and may be
/// called from any number of threads at once.
#[derive(Debug)]
pub struct LedgerEngine {
    store: Arc<AccountStore>,
    log: TransactionLog,
}

impl LedgerEngine {
    /// Create an engine with no accounts and an empty history
    pub fn new() -> Self {
        LedgerEngine {
            store: Arc::new(AccountStore::new()),
            log: TransactionLog::new(),
        }
    }

    /// Rebuild an engine by replaying a journal from empty state
    ///
    /// The replay reproduces the AccountStore exactly (ids, identities, names,
    /// balances) and keeps every record's sequence number and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::CorruptJournal` at the first record that could not
    /// have been produced by this engine: a sequence gap, an unknown or
    /// re-registered account, a missing or mismatched transfer partner, or a
    /// debit larger than the replayed balance.
    #[instrument(skip_all)]
    pub fn from_journal<I>(records: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let engine = LedgerEngine::new();
        let mut records = records.into_iter();

        while let Some(record) = records.next() {
            match record.kind {
                TransactionKind::Registration => engine.replay_registration(record)?,
                TransactionKind::Deposit | TransactionKind::Withdrawal => {
                    engine.replay_single(record)?
                }
                TransactionKind::TransferOut => {
                    let inbound = records.next().ok_or_else(|| {
                        LedgerError::corrupt_journal(record.sequence, "transfer has no TransferIn")
                    })?;
                    engine.replay_transfer(record, inbound)?
                }
                TransactionKind::TransferIn => {
                    return Err(LedgerError::corrupt_journal(
                        record.sequence,
                        "TransferIn without preceding TransferOut",
                    ))
                }
            }
        }

        debug!(
            accounts = engine.store.len(),
            records = engine.log.len(),
            "journal replayed"
        );
        Ok(engine)
    }

    /// Read-only view over committed state
    pub fn query(&self) -> QueryService {
        QueryService::new(Arc::clone(&self.store), self.log.clone())
    }

    /// Register a customer account for `identity`
    ///
    /// # Returns
    ///
    /// * `Ok(AccountId)` - The new account, with balance 0
    /// * `Err(LedgerError::InvalidIdentity)` - The identity is empty or padded with whitespace
    /// * `Err(LedgerError::InvalidName)` - The name is empty
    /// * `Err(LedgerError::DuplicateRegistration)` - The identity already has an account
    #[instrument(skip(self))]
    pub fn register_customer(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<AccountId, LedgerError> {
        let mut sequence = None;
        let account = self
            .store
            .register(identity, name, |account| {
                sequence = Some(self.log.append(RecordDraft::registration(
                    account.id,
                    Registrant {
                        identity: account.identity.clone(),
                        name: account.name.clone(),
                    },
                )));
            })
            .map_err(|e| rejected("register", e))?;

        debug!(account = %account, sequence = ?sequence, "customer registered");
        Ok(account)
    }

    /// Credit `amount` to an account
    ///
    /// # Returns
    ///
    /// * `Ok(Receipt)` - Sequence of the Deposit record and the new balance
    /// * `Err(LedgerError::InvalidAmount)` - The amount is zero
    /// * `Err(LedgerError::UnknownAccount)` - No such account
    /// * `Err(LedgerError::ArithmeticOverflow)` - The balance would overflow
    #[instrument(skip(self))]
    pub fn deposit(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError> {
        ensure_positive("deposit", amount)?;

        let receipt = self
            .store
            .update(account, |state| {
                let balance = state.credit(amount)?;
                let sequence = self.log.append(RecordDraft::deposit(state.id, amount));
                Ok(Receipt {
                    account_id: state.id,
                    sequence,
                    balance,
                })
            })
            .map_err(|e| rejected("deposit", e))?;

        debug!(sequence = %receipt.sequence, balance = receipt.balance, "deposit committed");
        Ok(receipt)
    }

    /// Debit `amount` from an account
    ///
    /// # Returns
    ///
    /// * `Ok(Receipt)` - Sequence of the Withdrawal record and the new balance
    /// * `Err(LedgerError::InvalidAmount)` - The amount is zero
    /// * `Err(LedgerError::UnknownAccount)` - No such account
    /// * `Err(LedgerError::InsufficientFunds)` - The amount exceeds the balance
    #[instrument(skip(self))]
    pub fn withdraw(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError> {
        ensure_positive("withdraw", amount)?;

        let receipt = self
            .store
            .update(account, |state| {
                let balance = state.debit(amount)?;
                let sequence = self.log.append(RecordDraft::withdrawal(state.id, amount));
                Ok(Receipt {
                    account_id: state.id,
                    sequence,
                    balance,
                })
            })
            .map_err(|e| rejected("withdraw", e))?;

        debug!(sequence = %receipt.sequence, balance = receipt.balance, "withdrawal committed");
        Ok(receipt)
    }

    /// Move `amount` from one account to another as a single unit
    ///
    /// Both accounts are locked (lower id first) for the whole operation, so no
    /// reader can observe the debit without the credit.
    ///
    /// # Returns
    ///
    /// * `Ok(TransferReceipt)` - The linked record pair and both new balances
    /// * `Err(LedgerError::InvalidAmount)` - The amount is zero
    /// * `Err(LedgerError::SameAccountTransfer)` - `from == to`
    /// * `Err(LedgerError::UnknownAccount)` - Either account does not exist
    /// * `Err(LedgerError::InsufficientFunds)` - The amount exceeds the sender's balance
    #[instrument(skip(self))]
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, LedgerError> {
        ensure_positive("transfer", amount)?;
        if from == to {
            return Err(rejected("transfer", LedgerError::same_account_transfer(from)));
        }

        let receipt = self
            .store
            .update_pair(from, to, |sender, receiver| {
                // Check the credit side first so a failure leaves both untouched
                receiver.credited(amount)?;
                let from_balance = sender.debit(amount)?;
                let to_balance = receiver.credit(amount)?;
                let (out_sequence, in_sequence) = self.log.append_transfer(from, to, amount);
                Ok(TransferReceipt {
                    from,
                    to,
                    amount,
                    out_sequence,
                    in_sequence,
                    from_balance,
                    to_balance,
                })
            })
            .map_err(|e| rejected("transfer", e))?;

        debug!(
            out_sequence = %receipt.out_sequence,
            in_sequence = %receipt.in_sequence,
            "transfer committed"
        );
        Ok(receipt)
    }

    /// Name and balance of an account
    pub fn check_data(&self, account: AccountId) -> Result<CustomerData, LedgerError> {
        self.query().check_data(account)
    }

    /// Ordered history of an account
    pub fn check_history(&self, account: AccountId) -> Result<History, LedgerError> {
        self.query().check_history(account)
    }

    fn replay_registration(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        let sequence = record.sequence;
        let registrant = record.registrant.clone().ok_or_else(|| {
            LedgerError::corrupt_journal(sequence, "registration without registrant")
        })?;
        if self.store.contains(record.account_id) {
            return Err(LedgerError::corrupt_journal(
                sequence,
                format!("account {} registered twice", record.account_id),
            ));
        }
        if record.amount != 0
            || !registrant.identity.is_well_formed()
            || registrant.name.trim().is_empty()
        {
            return Err(LedgerError::corrupt_journal(sequence, "malformed registration"));
        }

        self.log.restore(record.clone())?;
        self.store
            .restore(Account::new(
                record.account_id,
                registrant.identity,
                registrant.name,
            ))
            .map_err(|e| LedgerError::corrupt_journal(sequence, e.to_string()))
    }

    fn replay_single(&self, record: TransactionRecord) -> Result<(), LedgerError> {
        let sequence = record.sequence;
        if record.amount == 0 {
            return Err(LedgerError::corrupt_journal(sequence, "zero amount"));
        }

        self.store
            .update(record.account_id, |account| {
                match record.kind {
                    TransactionKind::Deposit => account.credit(record.amount)?,
                    _ => account.debit(record.amount)?,
                };
                self.log.restore(record.clone())
            })
            .map_err(|e| corrupt(sequence, e))
    }

    fn replay_transfer(
        &self,
        out: TransactionRecord,
        inbound: TransactionRecord,
    ) -> Result<(), LedgerError> {
        let sequence = out.sequence;
        let paired = inbound.kind == TransactionKind::TransferIn
            && out.linked_sequence == Some(inbound.sequence)
            && inbound.linked_sequence == Some(out.sequence)
            && out.counterparty_id == Some(inbound.account_id)
            && inbound.counterparty_id == Some(out.account_id)
            && out.amount == inbound.amount
            && out.amount > 0;
        if !paired {
            return Err(LedgerError::corrupt_journal(
                sequence,
                "transfer records are not a linked pair",
            ));
        }

        self.store
            .update_pair(out.account_id, inbound.account_id, |sender, receiver| {
                receiver.credited(out.amount)?;
                sender.debit(out.amount)?;
                receiver.credit(out.amount)?;
                self.log.restore(out.clone())?;
                self.log.restore(inbound.clone())
            })
            .map_err(|e| corrupt(sequence, e))
    }
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger for LedgerEngine {
    fn register_customer(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<AccountId, LedgerError> {
        LedgerEngine::register_customer(self, identity, name)
    }

    fn deposit(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError> {
        LedgerEngine::deposit(self, account, amount)
    }

    fn withdraw(&self, account: AccountId, amount: Amount) -> Result<Receipt, LedgerError> {
        LedgerEngine::withdraw(self, account, amount)
    }

    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, LedgerError> {
        LedgerEngine::transfer(self, from, to, amount)
    }

    fn check_data(&self, account: AccountId) -> Result<CustomerData, LedgerError> {
        LedgerEngine::check_data(self, account)
    }

    fn check_history(&self, account: AccountId) -> Result<History, LedgerError> {
        LedgerEngine::check_history(self, account)
    }

    fn account_of(&self, identity: &Identity) -> Result<AccountId, LedgerError> {
        self.store.account_of(identity)
    }

    fn accounts(&self) -> Vec<Account> {
        self.query().accounts()
    }
}

fn ensure_positive(operation: &str, amount: Amount) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(rejected(operation, LedgerError::invalid_amount(operation, amount)));
    }
    Ok(())
}

fn rejected(operation: &str, error: LedgerError) -> LedgerError {
    debug!(operation, error = %error, "operation rejected");
    error
}

fn corrupt(sequence: Sequence, error: LedgerError) -> LedgerError {
    match error {
        LedgerError::CorruptJournal { .. } => error,
        other => LedgerError::corrupt_journal(sequence, other.to_string()),
    }
}
