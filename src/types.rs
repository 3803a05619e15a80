//! Core type definitions shared across the ledger engine.

use rust_decimal::Decimal;

use crate::error::LedgerError;

/// Stable account identifier. Lock ordering is the ascending order of this id.
pub type AccountId = u64;

/// Caller-supplied idempotency key for a transfer.
pub type TransferId = String;

/// Fixed-point scale for all monetary amounts (2 fractional digits).
pub const AMOUNT_SCALE: u32 = 2;

/// Normalize an amount to the ledger scale.
///
/// Amounts with more than [`AMOUNT_SCALE`] significant fractional digits are
/// rejected rather than silently rounded. All amounts stored by the engine
/// go through this function, so balances and entries compare cleanly.
pub fn ensure_scale(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::Validation(format!(
            "Amount {} exceeds {} decimal places",
            amount, AMOUNT_SCALE
        )));
    }
    let mut normalized = amount;
    normalized.rescale(AMOUNT_SCALE);
    Ok(normalized)
}
