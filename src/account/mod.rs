//! Account records and the exclusive-access store.

pub mod model;
pub mod store;

pub use model::Account;
pub use store::{AccountLockSet, AccountStore};
