//! Idempotency Guard
//!
//! Wraps the check-then-act race in "does this transfer id exist, then write
//! it". Admission is a single compare-and-insert over an in-flight
//! reservation map, double-checked against committed journal entries, so two
//! concurrent callers with the same transfer id can never both pass: the
//! loser observes a duplicate, never an error and never a second
//! application. The journal's unique-transfer-id constraint remains the
//! commit-time backstop.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::LedgerError;
use crate::storage::StorageBackend;

/// Outcome of admitting a transfer id.
pub enum Admission {
    /// First caller for this id; holds the in-flight reservation.
    Fresh(Reservation),
    /// Already committed, or another caller is mid-flight.
    Duplicate,
}

/// In-flight reservation for one transfer id, released on drop.
///
/// The coordinator holds this across Locking..Committing. Releasing after a
/// successful commit is safe because the journal now answers for the id;
/// releasing after a failure lets a later retry apply the transfer fresh.
pub struct Reservation {
    transfer_id: String,
    in_flight: Arc<DashMap<String, ()>>,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.in_flight.remove(&self.transfer_id);
    }
}

pub struct IdempotencyGuard {
    backend: Arc<dyn StorageBackend>,
    in_flight: Arc<DashMap<String, ()>>,
}

impl IdempotencyGuard {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Atomically decide whether this caller may apply the transfer.
    pub async fn admit(&self, transfer_id: &str) -> Result<Admission, LedgerError> {
        if self.backend.exists_for_transfer(transfer_id).await? {
            return Ok(Admission::Duplicate);
        }

        let reservation = match self.in_flight.entry(transfer_id.to_string()) {
            Entry::Occupied(_) => return Ok(Admission::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(());
                Reservation {
                    transfer_id: transfer_id.to_string(),
                    in_flight: self.in_flight.clone(),
                }
            }
        };

        // The winner may have committed and released its reservation between
        // our first check and the insert above; re-check committed state.
        if self.backend.exists_for_transfer(transfer_id).await? {
            return Ok(Admission::Duplicate);
        }

        Ok(Admission::Fresh(reservation))
    }
}
