//! Transfer Coordinator
//!
//! Orchestrates one transfer through the phase machine: validation,
//! idempotency admission, ordered locking, balance check, mutation, and the
//! atomic commit of both account updates and both journal legs.
//!
//! Two account-access strategies, selected by configuration:
//! - exclusive (default): ordered per-account locks held Checking..Committing
//! - optimistic: snapshot reads plus version-checked commit, no held locks
//!
//! Either way, a `ConcurrencyConflict` during Locking/Committing triggers a
//! fresh-read retry, bounded by `max_retries`, before surfacing.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::account::{AccountLockSet, AccountStore};
use crate::config::LedgerConfig;
use crate::context::RequestContext;
use crate::error::LedgerError;
use crate::idempotency::{Admission, IdempotencyGuard};
use crate::journal::LedgerEntry;
use crate::storage::StorageBackend;
use crate::transfer::phase::TransferPhase;
use crate::transfer::result::TransferResult;
use crate::types::{self, AccountId};

pub struct TransferCoordinator {
    store: Arc<AccountStore>,
    guard: Arc<IdempotencyGuard>,
    backend: Arc<dyn StorageBackend>,
    config: LedgerConfig,
}

impl TransferCoordinator {
    pub fn new(
        store: Arc<AccountStore>,
        guard: Arc<IdempotencyGuard>,
        backend: Arc<dyn StorageBackend>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            guard,
            backend,
            config,
        }
    }

    /// Apply a transfer exactly once.
    ///
    /// Insufficient funds come back as a `Failure` result, not an error.
    /// A repeated transfer id comes back as `AlreadyProcessed` with the
    /// current balances and no new entries.
    pub async fn apply_transfer(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferResult, LedgerError> {
        debug!(
            correlation_id = %ctx.correlation_id(),
            phase = %TransferPhase::Validating,
            transfer_id,
            from,
            to,
            %amount,
            "transfer requested"
        );
        let amount = match Self::validate(transfer_id, from, to, amount) {
            Ok(amount) => amount,
            Err(e) => {
                warn!(
                    correlation_id = %ctx.correlation_id(),
                    phase = %TransferPhase::Rejected,
                    transfer_id,
                    error = %e,
                    "transfer rejected"
                );
                return Err(e);
            }
        };

        debug!(
            correlation_id = %ctx.correlation_id(),
            phase = %TransferPhase::Deduplicating,
            transfer_id,
            "checking idempotency"
        );
        let reservation = match self.guard.admit(transfer_id).await? {
            Admission::Duplicate => {
                let from_account = self.store.get(from).await?;
                let to_account = self.store.get(to).await?;
                info!(
                    correlation_id = %ctx.correlation_id(),
                    transfer_id,
                    "transfer already processed, returning current balances"
                );
                return Ok(TransferResult::already_processed(
                    transfer_id,
                    from_account.balance(),
                    to_account.balance(),
                ));
            }
            Admission::Fresh(reservation) => reservation,
        };

        let result = self.apply_admitted(ctx, transfer_id, from, to, amount).await;
        // Released on every exit path; after a successful commit the journal
        // answers for this id.
        drop(reservation);
        result
    }

    /// Retry wrapper: each attempt re-acquires, re-reads and re-checks.
    async fn apply_admitted(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferResult, LedgerError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = if self.config.enable_optimistic_locking {
                self.attempt_transfer(ctx, transfer_id, from, to, amount, None)
                    .await
            } else {
                debug!(
                    correlation_id = %ctx.correlation_id(),
                    phase = %TransferPhase::Locking,
                    transfer_id,
                    "acquiring ordered account locks"
                );
                match self.store.lock_ordered(&[from, to]).await {
                    Ok(locks) => {
                        self.attempt_transfer(ctx, transfer_id, from, to, amount, Some(locks))
                            .await
                    }
                    Err(e) => Err(e),
                }
            };

            match outcome {
                Err(LedgerError::ConcurrencyConflict(reason))
                    if attempt <= self.config.max_retries =>
                {
                    warn!(
                        correlation_id = %ctx.correlation_id(),
                        transfer_id,
                        attempt,
                        reason = %reason,
                        "concurrency conflict, retrying with fresh reads"
                    );
                    continue;
                }
                other => return other,
            }
        }
    }

    /// One Checking -> Mutating -> Committing pass. `locks`, when present,
    /// is held across the whole pass and released right after the commit.
    async fn attempt_transfer(
        &self,
        ctx: &RequestContext,
        transfer_id: &str,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        locks: Option<AccountLockSet>,
    ) -> Result<TransferResult, LedgerError> {
        let mut from_account = self.store.get(from).await?;
        let mut to_account = self.store.get(to).await?;

        debug!(
            correlation_id = %ctx.correlation_id(),
            phase = %TransferPhase::Checking,
            transfer_id,
            from_balance = %from_account.balance(),
            %amount,
            "checking funds"
        );
        if from_account.balance() < amount {
            warn!(
                correlation_id = %ctx.correlation_id(),
                phase = %TransferPhase::FailedBusiness,
                transfer_id,
                from,
                balance = %from_account.balance(),
                %amount,
                "transfer failed: insufficient funds"
            );
            return Ok(TransferResult::failure(
                transfer_id,
                format!(
                    "Insufficient funds in account {}: balance {}, requested {}",
                    from,
                    from_account.balance(),
                    amount
                ),
            ));
        }

        debug!(
            correlation_id = %ctx.correlation_id(),
            phase = %TransferPhase::Mutating,
            transfer_id,
            "applying debit and credit"
        );
        let from_version = from_account.version();
        let to_version = to_account.version();
        from_account.debit(amount)?;
        to_account.credit(amount)?;

        let entries = vec![
            LedgerEntry::debit(transfer_id, from, amount),
            LedgerEntry::credit(transfer_id, to, amount),
        ];

        debug!(
            correlation_id = %ctx.correlation_id(),
            phase = %TransferPhase::Committing,
            transfer_id,
            "committing account updates and journal entries"
        );
        let commit = self
            .backend
            .commit_transfer(
                vec![
                    (from_account.clone(), from_version),
                    (to_account.clone(), to_version),
                ],
                entries,
            )
            .await;
        drop(locks);

        match commit {
            Ok(()) => {
                info!(
                    correlation_id = %ctx.correlation_id(),
                    transfer_id,
                    phase = %TransferPhase::Succeeded,
                    from_balance = %from_account.balance(),
                    to_balance = %to_account.balance(),
                    "transfer committed"
                );
                Ok(TransferResult::success(
                    transfer_id,
                    from_account.balance(),
                    to_account.balance(),
                ))
            }
            Err(e @ LedgerError::ConcurrencyConflict(_)) => Err(e),
            Err(e) => {
                error!(
                    correlation_id = %ctx.correlation_id(),
                    transfer_id,
                    phase = %TransferPhase::Aborted,
                    error = %e,
                    "transfer aborted, no partial state committed"
                );
                Err(LedgerError::Internal(format!(
                    "transfer {} aborted: {}",
                    transfer_id, e
                )))
            }
        }
    }

    fn validate(
        transfer_id: &str,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if transfer_id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Transfer ID cannot be empty".to_string(),
            ));
        }
        if from == to {
            return Err(LedgerError::Validation(
                "Cannot transfer to the same account".to_string(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Transfer amount must be positive".to_string(),
            ));
        }
        types::ensure_scale(amount)
    }
}
