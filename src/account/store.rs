//! Account Store
//!
//! Owns account records and the per-account exclusive lock registry.
//!
//! Multi-account acquisition always sorts the requested ids ascending and
//! locks in that order, so two transfers touching overlapping accounts
//! (A->B and B->A) request locks in the same relative order and circular
//! wait is impossible by construction. Each wait is bounded by the
//! configured lock timeout and expiry surfaces as a retryable
//! `ConcurrencyConflict` instead of hanging.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::account::Account;
use crate::error::LedgerError;
use crate::journal::LedgerEntry;
use crate::storage::StorageBackend;
use crate::types::AccountId;

/// Exclusive access to a sorted set of accounts, released on drop.
pub struct AccountLockSet {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl AccountLockSet {
    pub(crate) fn len(&self) -> usize {
        self.guards.len()
    }
}

pub struct AccountStore {
    backend: Arc<dyn StorageBackend>,
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
    next_id: AtomicU64,
    lock_timeout: Duration,
}

impl AccountStore {
    pub fn new(backend: Arc<dyn StorageBackend>, lock_timeout: Duration) -> Self {
        Self {
            backend,
            locks: DashMap::new(),
            next_id: AtomicU64::new(1),
            lock_timeout,
        }
    }

    /// Create an account under an auto-allocated id. A positive opening
    /// balance is journaled as a seed-credit leg committed atomically with
    /// the account record.
    pub async fn create(&self, initial_balance: Decimal) -> Result<Account, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let account = Account::new(id, initial_balance)?;
        self.backend
            .insert_account(account.clone(), Self::seed_entries(&account))
            .await?;
        Ok(account)
    }

    /// Create an account under a caller-chosen id.
    pub async fn create_with_id(
        &self,
        id: AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let account = Account::new(id, initial_balance)?;
        self.backend
            .insert_account(account.clone(), Self::seed_entries(&account))
            .await?;
        // Keep the allocator ahead of explicit ids.
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        Ok(account)
    }

    fn seed_entries(account: &Account) -> Vec<LedgerEntry> {
        if account.balance() > Decimal::ZERO {
            vec![LedgerEntry::seed_credit(account.id(), account.balance())]
        } else {
            Vec::new()
        }
    }

    pub async fn get(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.backend.load_account(id).await
    }

    pub async fn exists(&self, id: AccountId) -> Result<bool, LedgerError> {
        self.backend.account_exists(id).await
    }

    /// Acquire exclusive access to every requested account, ascending by id.
    ///
    /// Fails `NotFound` per missing id; locks acquired before the failure
    /// point are released when the partial set drops. A wait exceeding the
    /// lock timeout fails `ConcurrencyConflict`.
    pub async fn lock_ordered(&self, ids: &[AccountId]) -> Result<AccountLockSet, LedgerError> {
        let mut sorted: Vec<AccountId> = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            if !self.backend.account_exists(id).await? {
                return Err(LedgerError::NotFound(id));
            }
            let cell = self
                .locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            let guard = tokio::time::timeout(self.lock_timeout, cell.lock_owned())
                .await
                .map_err(|_| {
                    LedgerError::ConcurrencyConflict(format!(
                        "timed out waiting for exclusive access to account {}",
                        id
                    ))
                })?;
            guards.push(guard);
        }
        Ok(AccountLockSet { guards })
    }

    /// Version-checked write-back through the storage collaborator.
    pub async fn save(
        &self,
        account: &Account,
        expected_version: u64,
    ) -> Result<(), LedgerError> {
        self.backend.save_account(account, expected_version).await
    }
}
