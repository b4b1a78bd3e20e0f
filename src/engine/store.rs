use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ulid::Ulid;

use crate::model::*;

use super::SharedSlotState;

/// In-process stand-in for the relational store. Holds every slot's
/// reservation list, the global confirmation-key index, and the client
/// records. Uniqueness of confirmation keys is enforced here, at the
/// storage layer, via an atomic insert-if-vacant on the key index.
pub struct Ledger {
    slots: DashMap<Slot, SharedSlotState>,
    key_index: DashMap<String, Slot>,
    clients: DashMap<Ulid, Client>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            key_index: DashMap::new(),
            clients: DashMap::new(),
        }
    }

    // ── Slot states ──────────────────────────────────────────

    /// Shared state for a slot, created on first use.
    pub fn slot_state(&self, slot: Slot) -> SharedSlotState {
        self.slots
            .entry(slot)
            .or_insert_with(|| SharedSlotState::new(tokio::sync::RwLock::new(SlotState::new(slot))))
            .value()
            .clone()
    }

    /// Shared state for a slot that already has reservations, if any.
    pub fn existing_slot(&self, slot: &Slot) -> Option<SharedSlotState> {
        self.slots.get(slot).map(|e| e.value().clone())
    }

    /// Snapshot of all slot states. Arc clones only; taken before any
    /// lock is awaited so no DashMap shard guard is held across .await.
    pub fn snapshot(&self) -> Vec<SharedSlotState> {
        self.slots.iter().map(|e| e.value().clone()).collect()
    }

    // ── Confirmation-key index ───────────────────────────────

    /// Claim a confirmation key for a slot. Returns false when the key is
    /// already taken; the caller retries with a fresh key.
    pub fn reserve_key(&self, key: &str, slot: Slot) -> bool {
        match self.key_index.entry(key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                true
            }
        }
    }

    /// Slot a confirmation key points at. Keys are never unmapped; a
    /// cancelled reservation keeps its key for the lifetime of the system.
    pub fn lookup_key(&self, key: &str) -> Option<Slot> {
        self.key_index.get(key).map(|e| *e.value())
    }

    // ── Clients ──────────────────────────────────────────────

    pub fn insert_client(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    pub fn client(&self, id: &Ulid) -> Option<Client> {
        self.clients.get(id).map(|e| e.value().clone())
    }
}
