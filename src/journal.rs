//! Ledger Journal - double-entry audit log
//!
//! Records every balance change as an immutable signed entry. The journal is
//! the audit trail; the cached `Account.balance` is the authoritative value
//! and the two are reconciled by [`derived_balance`](LedgerJournal::derived_balance).
//!
//! Every ordinary transfer commits exactly two legs under one transfer id: a
//! negative debit leg and a positive credit leg that sum to zero. The only
//! unbalanced entry kind is the seed credit written once at account creation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::storage::StorageBackend;
use crate::types::AccountId;

/// Which leg of a transfer an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Negative leg of an ordinary transfer
    Debit,
    /// Positive leg of an ordinary transfer
    Credit,
    /// Single unbalanced leg written at account creation only.
    /// Never produced by `apply_transfer` and excluded from the
    /// zero-sum balance law.
    SeedCredit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Debit => "DEBIT",
            EntryKind::Credit => "CREDIT",
            EntryKind::SeedCredit => "SEED_CREDIT",
        }
    }
}

/// One immutable leg of a transfer's effect on one account.
///
/// The sign of `amount` is derived from the kind in the constructors, so the
/// signed amount and the kind tag can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    id: Uuid,
    transfer_id: String,
    account_id: AccountId,
    amount: Decimal,
    kind: EntryKind,
    created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Debit leg: `magnitude` is positive, stored amount is negative.
    pub fn debit(transfer_id: &str, account_id: AccountId, magnitude: Decimal) -> Self {
        Self::build(transfer_id.to_string(), account_id, -magnitude, EntryKind::Debit)
    }

    /// Credit leg: stored amount is positive.
    pub fn credit(transfer_id: &str, account_id: AccountId, magnitude: Decimal) -> Self {
        Self::build(transfer_id.to_string(), account_id, magnitude, EntryKind::Credit)
    }

    /// Seed credit written at account creation, under a generated transfer id.
    pub fn seed_credit(account_id: AccountId, magnitude: Decimal) -> Self {
        let transfer_id = format!("SEED-{}", Uuid::new_v4());
        Self::build(transfer_id, account_id, magnitude, EntryKind::SeedCredit)
    }

    fn build(transfer_id: String, account_id: AccountId, amount: Decimal, kind: EntryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            transfer_id,
            account_id,
            amount,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transfer_id(&self) -> &str {
        &self.transfer_id
    }

    #[inline(always)]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Signed amount: negative for the debit leg, positive for credits.
    #[inline(always)]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Read/append interface over the journal half of the storage collaborator.
pub struct LedgerJournal {
    backend: Arc<dyn StorageBackend>,
}

impl LedgerJournal {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Atomic all-or-nothing append.
    pub async fn append(&self, entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
        self.backend.append_entries(entries).await
    }

    pub async fn exists_for_transfer(&self, transfer_id: &str) -> Result<bool, LedgerError> {
        self.backend.exists_for_transfer(transfer_id).await
    }

    /// Entries for one transfer, ordered by creation time.
    pub async fn entries_for_transfer(
        &self,
        transfer_id: &str,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.backend.entries_for_transfer(transfer_id).await
    }

    /// Entries touching one account, ordered by creation time.
    pub async fn entries_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.backend.entries_for_account(account_id).await
    }

    /// Signed sum over one transfer restricted to a kind. Used to verify the
    /// balance law independently of the coordinator's bookkeeping.
    pub async fn sum_by_transfer_and_kind(
        &self,
        transfer_id: &str,
        kind: EntryKind,
    ) -> Result<Decimal, LedgerError> {
        self.backend.sum_by_transfer_and_kind(transfer_id, kind).await
    }

    /// Signed sum across all entries of one transfer (seed legs included,
    /// though a seed transfer id only ever carries one entry).
    pub async fn signed_sum(&self, transfer_id: &str) -> Result<Decimal, LedgerError> {
        let entries = self.entries_for_transfer(transfer_id).await?;
        Ok(entries.iter().map(|e| e.amount()).sum())
    }

    /// Balance derivable from the journal alone: seed credit plus every
    /// signed transfer leg. Divergence from the cached `Account.balance` is
    /// an integrity error, surfaced by `LedgerService::audit_account`.
    pub async fn derived_balance(&self, account_id: AccountId) -> Result<Decimal, LedgerError> {
        let entries = self.entries_for_account(account_id).await?;
        Ok(entries.iter().map(|e| e.amount()).sum())
    }
}
