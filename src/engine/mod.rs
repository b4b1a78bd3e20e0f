mod admission;
mod analytics;
mod error;
mod mutations;
mod queries;
mod store;

pub use analytics::{
    AnalyticsFilters, AnalyticsRange, AnalyticsReport, AnalyticsTotals, TimelineBucket,
};
pub use error::EngineError;
pub use mutations::CreatedReservation;
pub use queries::HistoryQuery;
pub use store::Ledger;

use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::model::SlotState;

pub type SharedSlotState = Arc<RwLock<SlotState>>;

/// The booking engine: slot admission, the reservation state machine, and
/// the read models over them. One instance per process; concurrency is
/// serialized per slot by the `RwLock` inside [`SharedSlotState`], so
/// operations on different slots proceed independently.
pub struct Engine {
    ledger: Ledger,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            ledger: Ledger::new(),
        }
    }

    /// Look a confirmation key up and acquire its slot's write lock.
    /// `None` when the key was never issued.
    pub(super) async fn resolve_key_write(
        &self,
        key: &str,
    ) -> Option<OwnedRwLockWriteGuard<SlotState>> {
        let slot = self.ledger.lookup_key(key)?;
        let state = self.ledger.existing_slot(&slot)?;
        Some(state.write_owned().await)
    }
}
