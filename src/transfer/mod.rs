//! Transfer processing: the phase machine, the per-request outcome type and
//! the coordinator that drives one transfer end to end.

pub mod coordinator;
pub mod phase;
pub mod result;

pub use coordinator::TransferCoordinator;
pub use phase::TransferPhase;
pub use result::{TransferOutcome, TransferResult};
