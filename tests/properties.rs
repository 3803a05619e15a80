//! Property tests: conservation of funds, non-negative balances, and
//! per-transfer zero sums over arbitrary transfer sequences.

use proptest::prelude::*;
use rust_decimal::Decimal;

use ledger_service::config::LedgerConfig;
use ledger_service::context::RequestContext;
use ledger_service::service::LedgerService;
use ledger_service::transfer::TransferOutcome;

const ACCOUNTS: u64 = 4;
const OPENING_CENTS: i64 = 100_000;

fn transfer_op() -> impl Strategy<Value = (u64, u64, i64)> {
    (1..=ACCOUNTS, 1..=ACCOUNTS, 1i64..50_000)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_funds_conserved_and_balances_non_negative(
        ops in proptest::collection::vec(transfer_op(), 1..30),
        optimistic in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let svc = LedgerService::in_memory(LedgerConfig {
                enable_optimistic_locking: optimistic,
                ..LedgerConfig::default()
            });
            for id in 1..=ACCOUNTS {
                svc.create_account_with_id(id, Decimal::new(OPENING_CENTS, 2))
                    .await
                    .unwrap();
            }
            let ctx = RequestContext::new();

            for (i, (from, to, cents)) in ops.iter().enumerate() {
                let amount = Decimal::new(*cents, 2);
                let result = svc
                    .apply_transfer(&ctx, &format!("P-{}", i), *from, *to, amount)
                    .await;
                if from == to {
                    prop_assert!(result.is_err());
                } else {
                    let result = result.unwrap();
                    prop_assert_ne!(result.outcome, TransferOutcome::AlreadyProcessed);
                }
            }

            let mut total = Decimal::ZERO;
            for id in 1..=ACCOUNTS {
                let balance = svc.account_balance(id).await.unwrap();
                prop_assert!(balance >= Decimal::ZERO);
                prop_assert_eq!(svc.audit_account(id).await.unwrap(), balance);
                total += balance;
            }
            prop_assert_eq!(total, Decimal::new(OPENING_CENTS * ACCOUNTS as i64, 2));
            Ok(())
        })?;
    }

    #[test]
    fn prop_committed_transfers_sum_to_zero(
        ops in proptest::collection::vec(transfer_op(), 1..20),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let svc = LedgerService::in_memory(LedgerConfig::default());
            for id in 1..=ACCOUNTS {
                svc.create_account_with_id(id, Decimal::new(OPENING_CENTS, 2))
                    .await
                    .unwrap();
            }
            let ctx = RequestContext::new();

            for (i, (from, to, cents)) in ops.iter().enumerate() {
                if from == to {
                    continue;
                }
                let id = format!("P-{}", i);
                let result = svc
                    .apply_transfer(&ctx, &id, *from, *to, Decimal::new(*cents, 2))
                    .await
                    .unwrap();

                let entries = svc.transfer_entries(&id).await.unwrap();
                match result.outcome {
                    TransferOutcome::Success => {
                        prop_assert_eq!(entries.len(), 2);
                        prop_assert!(svc.is_transfer_balanced(&id).await.unwrap());
                    }
                    TransferOutcome::Failure => prop_assert!(entries.is_empty()),
                    TransferOutcome::AlreadyProcessed => {
                        prop_assert!(false, "fresh id reported as replay")
                    }
                }
            }
            Ok(())
        })?;
    }
}
