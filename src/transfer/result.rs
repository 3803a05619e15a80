//! Transfer result types returned to callers.
//!
//! A business failure (insufficient funds) is data, not control flow: it is
//! carried here as `Outcome::Failure`, never thrown across the coordinator
//! boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferOutcome {
    Success,
    Failure,
    AlreadyProcessed,
}

impl TransferOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOutcome::Success => "SUCCESS",
            TransferOutcome::Failure => "FAILURE",
            TransferOutcome::AlreadyProcessed => "ALREADY_PROCESSED",
        }
    }
}

/// Constructed once per `apply_transfer` call, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: String,
    pub outcome: TransferOutcome,
    pub message: String,
    pub from_balance_after: Option<Decimal>,
    pub to_balance_after: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl TransferResult {
    pub fn success(transfer_id: &str, from_balance: Decimal, to_balance: Decimal) -> Self {
        Self {
            transfer_id: transfer_id.to_string(),
            outcome: TransferOutcome::Success,
            message: "Transfer completed successfully".to_string(),
            from_balance_after: Some(from_balance),
            to_balance_after: Some(to_balance),
            timestamp: Utc::now(),
        }
    }

    pub fn failure(transfer_id: &str, message: String) -> Self {
        Self {
            transfer_id: transfer_id.to_string(),
            outcome: TransferOutcome::Failure,
            message,
            from_balance_after: None,
            to_balance_after: None,
            timestamp: Utc::now(),
        }
    }

    pub fn already_processed(
        transfer_id: &str,
        from_balance: Decimal,
        to_balance: Decimal,
    ) -> Self {
        Self {
            transfer_id: transfer_id.to_string(),
            outcome: TransferOutcome::AlreadyProcessed,
            message: "Transfer already processed".to_string(),
            from_balance_after: Some(from_balance),
            to_balance_after: Some(to_balance),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == TransferOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_success_carries_balances() {
        let result = TransferResult::success("T1", dec(90_000), dec(60_000));
        assert!(result.is_success());
        assert_eq!(result.from_balance_after, Some(dec(90_000)));
        assert_eq!(result.to_balance_after, Some(dec(60_000)));
    }

    #[test]
    fn test_failure_has_no_balances() {
        let result = TransferResult::failure("T1", "Insufficient funds".to_string());
        assert_eq!(result.outcome, TransferOutcome::Failure);
        assert!(result.from_balance_after.is_none());
        assert!(result.to_balance_after.is_none());
        assert!(result.message.contains("Insufficient funds"));
    }

    #[test]
    fn test_serializes_to_json() {
        let result = TransferResult::already_processed("T1", dec(100), dec(200));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"AlreadyProcessed\""));
        assert!(json.contains("\"T1\""));
    }
}
