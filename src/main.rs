//! Ledger Service demo binary.
//!
//! Spins up the in-memory backend, seeds two accounts, and runs a few
//! transfers end to end: a happy path, a duplicate id, and an insufficient
//! funds rejection. Useful for eyeballing the log output.

use rust_decimal::Decimal;

use ledger_service::config::AppConfig;
use ledger_service::context::RequestContext;
use ledger_service::logging::init_logging;
use ledger_service::service::LedgerService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load_or_default(&env);
    let _log_guard = init_logging(&app_config);

    tracing::info!(
        version = env!("GIT_HASH"),
        env = %env,
        "starting ledger service demo"
    );

    let service = LedgerService::in_memory(app_config.ledger);
    let ctx = RequestContext::new();

    let alice = service.create_account(Decimal::new(100_000, 2)).await?;
    let bob = service.create_account(Decimal::new(50_000, 2)).await?;
    println!(
        "created accounts {} ({}) and {} ({})",
        alice.id(),
        alice.balance(),
        bob.id(),
        bob.balance()
    );

    let result = service
        .apply_transfer(&ctx, "DEMO-1", alice.id(), bob.id(), Decimal::new(25_000, 2))
        .await?;
    println!("DEMO-1: {} - {}", result.outcome.as_str(), result.message);

    // Same id again: no double spend, same balances back.
    let repeat = service
        .apply_transfer(&ctx, "DEMO-1", alice.id(), bob.id(), Decimal::new(25_000, 2))
        .await?;
    println!("DEMO-1 repeat: {} - {}", repeat.outcome.as_str(), repeat.message);

    // More than the remaining balance: business failure, not an error.
    let broke = service
        .apply_transfer(&ctx, "DEMO-2", alice.id(), bob.id(), Decimal::new(999_999, 2))
        .await?;
    println!("DEMO-2: {} - {}", broke.outcome.as_str(), broke.message);

    for id in [alice.id(), bob.id()] {
        let audited = service.audit_account(id).await?;
        println!("account {} audited balance: {}", id, audited);
    }

    Ok(())
}
