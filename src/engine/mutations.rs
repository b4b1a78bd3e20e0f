use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};
use ulid::Ulid;

use crate::clock;
use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError, admission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedReservation {
    pub key: String,
}

/// Six characters of Crockford base32 drawn from a fresh ulid's random
/// tail. Uniqueness is NOT assumed — the caller verifies against the key
/// index and retries.
fn generate_key() -> String {
    let ulid = Ulid::new().to_string();
    ulid[ulid.len() - KEY_LEN..].to_string()
}

fn validate_client(client: &NewClient) -> Result<(), EngineError> {
    for field in [
        &client.first_name,
        &client.last_name,
        &client.nationality,
    ] {
        if field.is_empty() {
            return Err(EngineError::LimitExceeded("empty client field"));
        }
        if field.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("client field too long"));
        }
    }
    if client.phone.is_empty() || client.phone.len() > MAX_PHONE_LEN {
        return Err(EngineError::LimitExceeded("bad phone number"));
    }
    for document in [&client.national_id, &client.passport] {
        if let Some(doc) = document
            && doc.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("id document too long"));
        }
    }
    Ok(())
}

/// Flip overdue pending reservations in one slot to no_show. Idempotent;
/// the caller holds the slot's write lock. Returns how many flipped.
fn expire_overdue(state: &mut SlotState, now: NaiveDateTime) -> usize {
    if now <= clock::grace_deadline(state.slot.instant()) {
        return 0;
    }
    let mut flipped = 0;
    for r in &mut state.reservations {
        if r.status == ReservationStatus::Pending {
            r.status = ReservationStatus::NoShow;
            flipped += 1;
        }
    }
    flipped
}

impl Engine {
    /// Admit and create a booking: time parse, past-slot check, then the
    /// per-slot critical section covering the capacity count, the unique
    /// key claim, and both inserts. Nothing is persisted on any rejection.
    pub async fn create_reservation(
        &self,
        client: NewClient,
        date: NaiveDate,
        time: &str,
        kind: ReservationKind,
        now: NaiveDateTime,
    ) -> Result<CreatedReservation, EngineError> {
        validate_client(&client)?;
        let time = clock::parse_clock(time)?;
        let slot = Slot::new(date, time);
        clock::ensure_bookable(slot.instant(), now)?;

        let state = self.ledger.slot_state(slot);
        let mut guard = state.write().await;
        admission::check_admission(&guard, kind)?;

        let key = self.claim_key(slot)?;
        let client_id = Ulid::new();
        self.ledger.insert_client(client.into_record(client_id));
        guard.insert(Reservation {
            id: Ulid::new(),
            slot,
            key: key.clone(),
            kind,
            status: ReservationStatus::Pending,
            client_id,
            staff_id: None,
            checked_in_at: None,
        });

        metrics::counter!(crate::observability::RESERVATIONS_CREATED_TOTAL).increment(1);
        info!("reservation {key} created for {date} {}", clock::format_clock(time));
        Ok(CreatedReservation { key })
    }

    /// Generate-then-verify against the storage uniqueness constraint,
    /// bounded by a small retry count.
    fn claim_key(&self, slot: Slot) -> Result<String, EngineError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let key = generate_key();
            if self.ledger.reserve_key(&key, slot) {
                return Ok(key);
            }
        }
        Err(EngineError::KeySpaceExhausted)
    }

    /// pending → cancelled, located by confirmation key. Irreversible; the
    /// record stays in the ledger and the key stays claimed.
    pub async fn cancel_reservation(&self, key: &str) -> Result<(), EngineError> {
        let mut guard = self
            .resolve_key_write(key)
            .await
            .ok_or(EngineError::NotFound)?;
        let reservation = guard.find_by_key_mut(key).ok_or(EngineError::NotFound)?;
        if reservation.status != ReservationStatus::Pending {
            return Err(EngineError::NotFound);
        }
        reservation.status = ReservationStatus::Cancelled;

        metrics::counter!(crate::observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        info!("reservation {key} cancelled");
        Ok(())
    }

    /// pending → confirmed, or no_show → confirmed_late. Overdue pendings
    /// in the slot expire first so lateness is judged against the clock,
    /// not against whether a sweep happened to run. Records the staff
    /// member and the arrival time.
    pub async fn check_in(
        &self,
        key: &str,
        staff_id: Ulid,
        now: NaiveDateTime,
    ) -> Result<ReservationStatus, EngineError> {
        let mut guard = self
            .resolve_key_write(key)
            .await
            .ok_or(EngineError::InvalidCode)?;
        expire_overdue(&mut guard, now);

        let reservation = guard.find_by_key_mut(key).ok_or(EngineError::InvalidCode)?;
        let next = match reservation.status {
            ReservationStatus::Pending => ReservationStatus::Confirmed,
            ReservationStatus::NoShow => ReservationStatus::ConfirmedLate,
            _ => return Err(EngineError::InvalidCode),
        };
        reservation.status = next;
        reservation.staff_id = Some(staff_id);
        reservation.checked_in_at = Some(now);

        metrics::counter!(crate::observability::CHECKINS_TOTAL).increment(1);
        info!("reservation {key} checked in as {next:?}");
        Ok(next)
    }

    /// Lazy expiry sweep over every slot whose grace deadline has passed.
    /// Runs before reads that need accurate statuses; idempotent.
    pub async fn sweep_expired(&self, now: NaiveDateTime) -> usize {
        let mut overdue = Vec::new();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            let has_pending = guard
                .reservations
                .iter()
                .any(|r| r.status == ReservationStatus::Pending);
            if has_pending && now > clock::grace_deadline(guard.slot.instant()) {
                overdue.push(state.clone());
            }
        }

        let mut flipped = 0;
        for state in overdue {
            let mut guard = state.write().await;
            flipped += expire_overdue(&mut guard, now);
        }

        if flipped > 0 {
            metrics::counter!(crate::observability::SWEEP_EXPIRED_TOTAL).increment(flipped as u64);
            info!("sweep expired {flipped} pending reservation(s)");
        } else {
            debug!("sweep found nothing to expire");
        }
        flipped
    }
}
