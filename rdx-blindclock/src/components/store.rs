//! Keyed, per-tournament locked storage for `ClockState`.

use crate::common::TournamentId;
use crate::components::state::ClockState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::trace;

type Slot = Arc<Mutex<Option<ClockState>>>;

/// Concurrency-safe storage of one `ClockState` per tournament.
///
/// Every tournament gets its own slot behind its own mutex. The outer map lock
/// is only held long enough to find or create a slot, never while a slot is
/// locked, so work on one tournament never waits on work on another. The store
/// knows nothing about tournament semantics.
#[derive(Clone, Default)]
pub struct ClockStore {
    slots: Arc<RwLock<HashMap<TournamentId, Slot>>>,
}

/// Exclusive access to one tournament's slot.
///
/// Held by the engine for the whole read-modify-write of an action, which is
/// what serializes concurrent actions against the same tournament.
pub struct ClockGuard {
    slot: OwnedMutexGuard<Option<ClockState>>,
}

impl ClockGuard {
    pub fn get(&self) -> Option<ClockState> {
        *self.slot
    }

    pub fn put(&mut self, state: ClockState) {
        *self.slot = Some(state);
    }

    pub fn delete(&mut self) {
        *self.slot = None;
    }
}

impl ClockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the slot for `id`, creating it if needed, and waits for any
    /// in-flight holder to finish.
    pub async fn lock(&self, id: &TournamentId) -> ClockGuard {
        let slot = self.slot(id).await;
        ClockGuard {
            slot: slot.lock_owned().await,
        }
    }

    /// Returns the current state for `id`, if any. No side effects.
    pub async fn get(&self, id: &TournamentId) -> Option<ClockState> {
        let slot = self.slots.read().await.get(id).cloned()?;
        let state = *slot.lock().await;
        state
    }

    /// Replaces the state for `id`.
    pub async fn put(&self, id: &TournamentId, state: ClockState) {
        self.lock(id).await.put(state);
    }

    /// Removes the state for `id`. Deleting an absent entry is not an error.
    pub async fn delete(&self, id: &TournamentId) {
        let slot = self.slots.read().await.get(id).cloned();
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
        self.prune(id).await;
    }

    /// Drops the slot for `id` once it is empty and nobody else holds it.
    ///
    /// Slots are only cloned under the map's read lock, so with the write lock
    /// held a strong count of one means no task can be waiting on this slot.
    pub async fn prune(&self, id: &TournamentId) {
        let mut slots = self.slots.write().await;
        let removable = slots.get(id).is_some_and(|slot| {
            Arc::strong_count(slot) == 1
                && slot.try_lock().map(|state| state.is_none()).unwrap_or(false)
        });
        if removable {
            slots.remove(id);
            trace!(tournament = %id, "pruned empty clock slot");
        }
    }

    async fn slot(&self, id: &TournamentId) -> Slot {
        if let Some(slot) = self.slots.read().await.get(id) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(id.clone()).or_default())
    }
}
