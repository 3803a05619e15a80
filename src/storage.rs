//! Storage Collaborator
//!
//! [`StorageBackend`] is the seam between the transfer engine and whatever
//! holds the data: account records keyed by id, the append-only journal, and
//! one transactional unit of work ([`commit_transfer`](StorageBackend::commit_transfer))
//! that lands both account updates and both ledger entries or nothing at all.
//!
//! [`MemoryBackend`] is the in-process implementation. All writes are
//! serialized through a single commit mutex, which gives `commit_transfer`
//! its all-or-nothing guarantee; account saves are version-checked CAS
//! operations, and `append_entries` enforces the unique-transfer-id
//! constraint at commit time as the idempotency backstop.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::account::Account;
use crate::error::LedgerError;
use crate::journal::{EntryKind, LedgerEntry};
use crate::types::AccountId;

/// Persistence + journal collaborator contract.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    // === Accounts ===
    async fn load_account(&self, id: AccountId) -> Result<Account, LedgerError>;

    async fn account_exists(&self, id: AccountId) -> Result<bool, LedgerError>;

    /// Persist a new account and its seed entries as one atomic unit.
    /// Fails with `AlreadyExists` on a duplicate id; a journal failure
    /// leaves no account committed.
    async fn insert_account(
        &self,
        account: Account,
        seed_entries: Vec<LedgerEntry>,
    ) -> Result<(), LedgerError>;

    /// Version-checked write: fails with `ConcurrencyConflict` if the stored
    /// version no longer matches `expected_version`.
    async fn save_account(
        &self,
        account: &Account,
        expected_version: u64,
    ) -> Result<(), LedgerError>;

    // === Journal ===
    /// Atomic all-or-nothing append. A duplicate transfer id leaves nothing
    /// committed.
    async fn append_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError>;

    async fn exists_for_transfer(&self, transfer_id: &str) -> Result<bool, LedgerError>;

    async fn entries_for_transfer(
        &self,
        transfer_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    async fn entries_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    async fn sum_by_transfer_and_kind(
        &self,
        transfer_id: &str,
        kind: EntryKind,
    ) -> Result<Decimal, LedgerError>;

    // === Unit of work ===
    /// Persist every `(account, expected_version)` update and every entry as
    /// one atomic unit. Any version mismatch fails the whole commit with
    /// `ConcurrencyConflict`; any other failure leaves no partial state.
    async fn commit_transfer(
        &self,
        updates: Vec<(Account, u64)>,
        entries: Vec<LedgerEntry>,
    ) -> Result<(), LedgerError>;
}

#[derive(Default)]
struct JournalState {
    entries: Vec<LedgerEntry>,
    transfer_ids: HashSet<String>,
}

impl JournalState {
    /// Validate-then-apply so a failure leaves the journal untouched.
    fn append_checked(&mut self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
        let mut incoming: HashSet<&str> = HashSet::new();
        for entry in &entries {
            incoming.insert(entry.transfer_id());
        }
        for transfer_id in &incoming {
            if self.transfer_ids.contains(*transfer_id) {
                return Err(LedgerError::Internal(format!(
                    "transfer {} already journaled",
                    transfer_id
                )));
            }
        }
        for entry in &entries {
            self.transfer_ids.insert(entry.transfer_id().to_string());
        }
        self.entries.extend(entries);
        Ok(())
    }
}

/// In-memory storage backend.
pub struct MemoryBackend {
    accounts: DashMap<AccountId, Account>,
    journal: Mutex<JournalState>,
    // Serializes all writers; held across the version checks and the
    // mutations of commit_transfer so the unit of work is atomic.
    commit_lock: Mutex<()>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            journal: Mutex::new(JournalState::default()),
            commit_lock: Mutex::new(()),
        }
    }

    fn check_version(&self, account: &Account, expected: u64) -> Result<(), LedgerError> {
        match self.accounts.get(&account.id()) {
            None => Err(LedgerError::NotFound(account.id())),
            Some(stored) if stored.version() != expected => {
                Err(LedgerError::ConcurrencyConflict(format!(
                    "account {} version is {}, expected {}",
                    account.id(),
                    stored.version(),
                    expected
                )))
            }
            Some(_) => Ok(()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .get(&id)
            .map(|a| a.clone())
            .ok_or(LedgerError::NotFound(id))
    }

    async fn account_exists(&self, id: AccountId) -> Result<bool, LedgerError> {
        Ok(self.accounts.contains_key(&id))
    }

    async fn insert_account(
        &self,
        account: Account,
        seed_entries: Vec<LedgerEntry>,
    ) -> Result<(), LedgerError> {
        let _commit = self.commit_lock.lock().await;
        if self.accounts.contains_key(&account.id()) {
            return Err(LedgerError::AlreadyExists(account.id()));
        }
        // Journal first: a failed append leaves no account behind.
        let mut journal = self.journal.lock().await;
        journal.append_checked(seed_entries)?;
        self.accounts.insert(account.id(), account);
        Ok(())
    }

    async fn save_account(
        &self,
        account: &Account,
        expected_version: u64,
    ) -> Result<(), LedgerError> {
        let _commit = self.commit_lock.lock().await;
        self.check_version(account, expected_version)?;
        self.accounts.insert(account.id(), account.clone());
        Ok(())
    }

    async fn append_entries(&self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
        let _commit = self.commit_lock.lock().await;
        let mut journal = self.journal.lock().await;
        journal.append_checked(entries)
    }

    async fn exists_for_transfer(&self, transfer_id: &str) -> Result<bool, LedgerError> {
        let journal = self.journal.lock().await;
        Ok(journal.transfer_ids.contains(transfer_id))
    }

    async fn entries_for_transfer(
        &self,
        transfer_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let journal = self.journal.lock().await;
        Ok(journal
            .entries
            .iter()
            .filter(|e| e.transfer_id() == transfer_id)
            .cloned()
            .collect())
    }

    async fn entries_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let journal = self.journal.lock().await;
        Ok(journal
            .entries
            .iter()
            .filter(|e| e.account_id() == account_id)
            .cloned()
            .collect())
    }

    async fn sum_by_transfer_and_kind(
        &self,
        transfer_id: &str,
        kind: EntryKind,
    ) -> Result<Decimal, LedgerError> {
        let journal = self.journal.lock().await;
        Ok(journal
            .entries
            .iter()
            .filter(|e| e.transfer_id() == transfer_id && e.kind() == kind)
            .map(|e| e.amount())
            .sum())
    }

    async fn commit_transfer(
        &self,
        updates: Vec<(Account, u64)>,
        entries: Vec<LedgerEntry>,
    ) -> Result<(), LedgerError> {
        let _commit = self.commit_lock.lock().await;

        // Validate every precondition before mutating anything.
        for (account, expected_version) in &updates {
            self.check_version(account, *expected_version)?;
        }
        let mut journal = self.journal.lock().await;
        journal.append_checked(entries)?;

        for (account, _) in updates {
            self.accounts.insert(account.id(), account);
        }
        Ok(())
    }
}
