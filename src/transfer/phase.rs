//! Transfer Phase Definitions
//!
//! Each `apply_transfer` call walks these phases in order. Terminal phases:
//! Succeeded, FailedBusiness, Rejected, Aborted.

use std::fmt;

/// Per-call transfer state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferPhase {
    /// Input checks - no locks, no side effects yet
    Validating,

    /// Idempotency admission for the transfer id
    Deduplicating,

    /// Ordered exclusive acquisition of both accounts
    Locking,

    /// Balance sufficiency check under exclusive access
    Checking,

    /// Debit / credit applied to the in-memory copies
    Mutating,

    /// Account updates and journal entries land as one atomic unit
    Committing,

    /// Terminal: transfer applied, balances returned
    Succeeded,

    /// Terminal: business rule failure returned as data (insufficient funds)
    FailedBusiness,

    /// Terminal: validation or missing-account rejection, no side effects
    Rejected,

    /// Terminal: commit failed, no partial state visible
    Aborted,
}

impl TransferPhase {
    /// Check if this is a terminal phase (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferPhase::Succeeded
                | TransferPhase::FailedBusiness
                | TransferPhase::Rejected
                | TransferPhase::Aborted
        )
    }

    /// Check if the call holds exclusive account access in this phase
    #[inline]
    pub fn holds_locks(&self) -> bool {
        matches!(
            self,
            TransferPhase::Checking | TransferPhase::Mutating | TransferPhase::Committing
        )
    }

    /// Get human-readable phase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Validating => "VALIDATING",
            TransferPhase::Deduplicating => "DEDUPLICATING",
            TransferPhase::Locking => "LOCKING",
            TransferPhase::Checking => "CHECKING",
            TransferPhase::Mutating => "MUTATING",
            TransferPhase::Committing => "COMMITTING",
            TransferPhase::Succeeded => "SUCCEEDED",
            TransferPhase::FailedBusiness => "FAILED_BUSINESS",
            TransferPhase::Rejected => "REJECTED",
            TransferPhase::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
