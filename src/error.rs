//! Ledger Error Types
//!
//! One taxonomy for the whole engine. Validation and not-found conditions
//! fail fast with no side effects; insufficient funds never crosses the
//! coordinator boundary as an error (it becomes a `Failure` result);
//! concurrency conflicts are retried internally before surfacing.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::AccountId;

/// Ledger error taxonomy
///
/// Error codes are stable strings for consistent API responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("{0}")]
    Validation(String),

    // === Account Errors ===
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Account already exists: {0}")]
    AlreadyExists(AccountId),

    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    // === Concurrency Errors ===
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    // === Audit Errors ===
    #[error("Integrity violation on account {account}: cached balance {cached}, journal-derived {derived}")]
    Integrity {
        account: AccountId,
        cached: Decimal,
        derived: Decimal,
    },

    // === System Errors ===
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::NotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::AlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            LedgerError::Integrity { .. } => "INTEGRITY_VIOLATION",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::Validation(_) | LedgerError::AlreadyExists(_) => 400,
            LedgerError::NotFound(_) => 404,
            LedgerError::InsufficientFunds { .. } => 422,
            LedgerError::ConcurrencyConflict(_) => 409,
            LedgerError::Integrity { .. } | LedgerError::Internal(_) => 500,
        }
    }

    /// Whether an internal retry with a fresh read may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict(_))
    }
}
