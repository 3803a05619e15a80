//! Ledger Service
//!
//! A double-entry fund-transfer engine: accounts with cached balances and
//! optimistic versions, an append-only journal of signed entries, transfer-id
//! idempotency, and a coordinator that moves money under ordered exclusive
//! locks or optimistic version checks.
//!
//! Entry point is [`service::LedgerService`]; everything below it is also
//! public for callers that want to wire their own storage backend.

pub mod account;
pub mod config;
pub mod context;
pub mod error;
pub mod idempotency;
pub mod journal;
pub mod logging;
pub mod service;
pub mod storage;
pub mod transfer;
pub mod types;

pub use account::{Account, AccountStore};
pub use config::{AppConfig, LedgerConfig};
pub use context::RequestContext;
pub use error::LedgerError;
pub use journal::{EntryKind, LedgerEntry, LedgerJournal};
pub use service::LedgerService;
pub use storage::{MemoryBackend, StorageBackend};
pub use transfer::{TransferCoordinator, TransferOutcome, TransferPhase, TransferResult};
pub use types::{AccountId, TransferId};
