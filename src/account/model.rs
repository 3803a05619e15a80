//! ENFORCED ACCOUNT TYPE
//!
//! The single source of truth for balance mutations.
//!
//! # Invariants (enforced by private fields):
//! - `balance >= 0` at all observable times
//! - `version` increments on every mutation; writers supply the version
//!   they read and storage rejects mismatches
//! - All state changes return Result

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{self, AccountId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    id: AccountId,      // PRIVATE - immutable after creation
    balance: Decimal,   // PRIVATE - ONLY modified through debit/credit
    version: u64,       // PRIVATE - optimistic concurrency counter
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Create an account with a validated, scale-normalized opening balance.
    pub fn new(id: AccountId, initial_balance: Decimal) -> Result<Self, LedgerError> {
        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Initial balance must be non-negative".to_string(),
            ));
        }
        let balance = types::ensure_scale(initial_balance)?;
        let now = Utc::now();
        Ok(Self {
            id,
            balance,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    #[inline(always)]
    pub fn id(&self) -> AccountId {
        self.id
    }

    #[inline(always)]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Remove funds. Fails on non-positive amounts and on anything that
    /// would leave the balance negative.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        let amount = Self::positive_amount(amount, "Debit")?;
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: self.id,
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.touch();
        Ok(())
    }

    /// Add funds. Fails on non-positive amounts.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        let amount = Self::positive_amount(amount, "Credit")?;
        self.balance += amount;
        self.touch();
        Ok(())
    }

    fn positive_amount(amount: Decimal, op: &str) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "{} amount must be positive",
                op
            )));
        }
        types::ensure_scale(amount)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
