//! Ledger Service
//!
//! Public facade over the account store, journal, idempotency guard and
//! transfer coordinator. Owns the wiring; callers hold one `LedgerService`
//! and never touch the components directly.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::account::{Account, AccountStore};
use crate::config::LedgerConfig;
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::idempotency::IdempotencyGuard;
use crate::journal::{EntryKind, LedgerEntry, LedgerJournal};
use crate::storage::{MemoryBackend, StorageBackend};
use crate::transfer::{TransferCoordinator, TransferResult};
use crate::types::AccountId;

pub struct LedgerService {
    store: Arc<AccountStore>,
    journal: Arc<LedgerJournal>,
    coordinator: TransferCoordinator,
}

impl LedgerService {
    pub fn new(backend: Arc<dyn StorageBackend>, config: LedgerConfig) -> Self {
        let store = Arc::new(AccountStore::new(
            backend.clone(),
            Duration::from_millis(config.lock_timeout_ms),
        ));
        let journal = Arc::new(LedgerJournal::new(backend.clone()));
        let guard = Arc::new(IdempotencyGuard::new(backend.clone()));
        let coordinator = TransferCoordinator::new(store.clone(), guard, backend, config);
        Self {
            store,
            journal,
            coordinator,
        }
    }

    /// Service over the in-memory backend, for demos and tests.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), config)
    }

    /// Create an account with a generated id. A positive opening balance is
    /// recorded as a seed-credit entry committed atomically with the account
    /// record, so the journal covers every unit the account has ever held.
    pub async fn create_account(&self, initial_balance: Decimal) -> Result<Account, LedgerError> {
        let account = self.store.create(initial_balance).await?;
        info!(
            account_id = account.id(),
            balance = %account.balance(),
            "account created"
        );
        Ok(account)
    }

    /// Create an account under a caller-chosen id.
    pub async fn create_account_with_id(
        &self,
        id: AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let account = self.store.create_with_id(id, initial_balance).await?;
        info!(
            account_id = account.id(),
            balance = %account.balance(),
            "account created"
        );
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.get(id).await
    }

    pub async fn account_balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        Ok(self.store.get(id).await?.balance())
    }

    /// Journal entries touching an account, newest first.
    pub async fn account_history(
        &self,
        id: AccountId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        if !self.store.exists(id).await? {
            return Err(LedgerError::NotFound(id));
        }
        let mut entries = self.journal.entries_for_account(id).await?;
        entries.reverse();
        Ok(entries)
    }

    pub async fn transfer_entries(
        &self,
        transfer_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.journal.entries_for_transfer(transfer_id).await
    }

    /// True when the transfer's debit and credit legs cancel out.
    pub async fn is_transfer_balanced(&self, transfer_id: &str) -> Result<bool, LedgerError> {
        let debits = self
            .journal
            .sum_by_transfer_and_kind(transfer_id, EntryKind::Debit)
            .await?;
        let credits = self
            .journal
            .sum_by_transfer_and_kind(transfer_id, EntryKind::Credit)
            .await?;
        Ok(debits + credits == Decimal::ZERO)
    }

    /// Reconcile the cached balance against the journal-derived one.
    pub async fn audit_account(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        let account = self.store.get(id).await?;
        let derived = self.journal.derived_balance(id).await?;
        if derived != account.balance() {
            warn!(
                account_id = id,
                cached = %account.balance(),
                derived = %derived,
                "balance diverged from journal"
            );
            return Err(LedgerError::Integrity {
                account: id,
                cached: account.balance(),
                derived,
            });
        }
        Ok(derived)
    }

    pub async fn apply_transfer(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferResult, LedgerError> {
        self.coordinator
            .apply_transfer(ctx, transfer_id, from, to, amount)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn service() -> LedgerService {
        LedgerService::in_memory(LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_create_account_seeds_journal() {
        let svc = service();
        let account = svc.create_account(dec(100_000)).await.unwrap();

        let history = svc.account_history(account.id()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), EntryKind::SeedCredit);
        assert_eq!(history[0].amount(), dec(100_000));
        assert_eq!(svc.audit_account(account.id()).await.unwrap(), dec(100_000));
    }

    #[tokio::test]
    async fn test_create_zero_balance_account_journals_nothing() {
        let svc = service();
        let account = svc.create_account(Decimal::ZERO).await.unwrap();
        assert!(svc.account_history(account.id()).await.unwrap().is_empty());
        assert_eq!(svc.audit_account(account.id()).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_failed_seed_write_persists_no_account() {
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicBool, Ordering};

        /// Fails the first seeded insert, then recovers.
        struct SeedFailingBackend {
            inner: MemoryBackend,
            failed_once: AtomicBool,
        }

        #[async_trait]
        impl StorageBackend for SeedFailingBackend {
            async fn load_account(&self, id: AccountId) -> Result<Account, LedgerError> {
                self.inner.load_account(id).await
            }
            async fn account_exists(&self, id: AccountId) -> Result<bool, LedgerError> {
                self.inner.account_exists(id).await
            }
            async fn insert_account(
                &self,
                account: Account,
                seed_entries: Vec<LedgerEntry>,
            ) -> Result<(), LedgerError> {
                if !seed_entries.is_empty() && !self.failed_once.swap(true, Ordering::SeqCst) {
                    return Err(LedgerError::Internal("journal down".to_string()));
                }
                self.inner.insert_account(account, seed_entries).await
            }
            async fn save_account(
                &self,
                account: &Account,
                expected_version: u64,
            ) -> Result<(), LedgerError> {
                self.inner.save_account(account, expected_version).await
            }
            async fn append_entries(
                &self,
                entries: Vec<LedgerEntry>,
            ) -> Result<(), LedgerError> {
                self.inner.append_entries(entries).await
            }
            async fn exists_for_transfer(&self, transfer_id: &str) -> Result<bool, LedgerError> {
                self.inner.exists_for_transfer(transfer_id).await
            }
            async fn entries_for_transfer(
                &self,
                transfer_id: &str,
            ) -> Result<Vec<LedgerEntry>, LedgerError> {
                self.inner.entries_for_transfer(transfer_id).await
            }
            async fn entries_for_account(
                &self,
                account_id: AccountId,
            ) -> Result<Vec<LedgerEntry>, LedgerError> {
                self.inner.entries_for_account(account_id).await
            }
            async fn sum_by_transfer_and_kind(
                &self,
                transfer_id: &str,
                kind: EntryKind,
            ) -> Result<Decimal, LedgerError> {
                self.inner.sum_by_transfer_and_kind(transfer_id, kind).await
            }
            async fn commit_transfer(
                &self,
                updates: Vec<(Account, u64)>,
                entries: Vec<LedgerEntry>,
            ) -> Result<(), LedgerError> {
                self.inner.commit_transfer(updates, entries).await
            }
        }

        let backend = Arc::new(SeedFailingBackend {
            inner: MemoryBackend::new(),
            failed_once: AtomicBool::new(false),
        });
        let svc = LedgerService::new(backend, LedgerConfig::default());

        let result = svc.create_account_with_id(1, dec(10_000)).await;
        assert!(matches!(result, Err(LedgerError::Internal(_))));

        // No half-created account: the id is absent and still free.
        assert!(matches!(
            svc.get_account(1).await,
            Err(LedgerError::NotFound(1))
        ));

        // A retry of the same creation goes through cleanly.
        let account = svc.create_account_with_id(1, dec(10_000)).await.unwrap();
        assert_eq!(account.balance(), dec(10_000));
        assert_eq!(svc.audit_account(1).await.unwrap(), dec(10_000));
    }

    #[tokio::test]
    async fn test_create_account_rejects_negative_balance() {
        let svc = service();
        let result = svc.create_account(dec(-500)).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_duplicate_id_rejected() {
        let svc = service();
        svc.create_account_with_id(7, dec(100)).await.unwrap();
        let result = svc.create_account_with_id(7, dec(100)).await;
        assert!(matches!(result, Err(LedgerError::AlreadyExists(7))));
    }

    #[tokio::test]
    async fn test_generated_ids_skip_past_explicit_ids() {
        let svc = service();
        svc.create_account_with_id(10, dec(100)).await.unwrap();
        let next = svc.create_account(dec(100)).await.unwrap();
        assert!(next.id() > 10);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let svc = service();
        let a = svc.create_account_with_id(1, dec(100_000)).await.unwrap();
        svc.create_account_with_id(2, Decimal::ZERO).await.unwrap();
        let ctx = RequestContext::new();

        svc.apply_transfer(&ctx, "T1", 1, 2, dec(10_000))
            .await
            .unwrap();
        svc.apply_transfer(&ctx, "T2", 1, 2, dec(5_000))
            .await
            .unwrap();

        let history = svc.account_history(a.id()).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].transfer_id(), "T2");
        assert_eq!(history[1].transfer_id(), "T1");
        assert_eq!(history[2].kind(), EntryKind::SeedCredit);
    }

    #[tokio::test]
    async fn test_history_for_missing_account() {
        let svc = service();
        assert!(matches!(
            svc.account_history(404).await,
            Err(LedgerError::NotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_transfer_is_balanced() {
        let svc = service();
        svc.create_account_with_id(1, dec(100_000)).await.unwrap();
        svc.create_account_with_id(2, Decimal::ZERO).await.unwrap();
        let ctx = RequestContext::new();

        svc.apply_transfer(&ctx, "T1", 1, 2, dec(25_000))
            .await
            .unwrap();

        assert!(svc.is_transfer_balanced("T1").await.unwrap());
        let entries = svc.transfer_entries("T1").await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_audit_after_transfers() {
        let svc = service();
        svc.create_account_with_id(1, dec(100_000)).await.unwrap();
        svc.create_account_with_id(2, dec(30_000)).await.unwrap();
        let ctx = RequestContext::new();

        svc.apply_transfer(&ctx, "T1", 1, 2, dec(40_000))
            .await
            .unwrap();

        assert_eq!(svc.audit_account(1).await.unwrap(), dec(60_000));
        assert_eq!(svc.audit_account(2).await.unwrap(), dec(70_000));
        assert_eq!(svc.account_balance(1).await.unwrap(), dec(60_000));
    }
}
