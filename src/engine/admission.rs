use crate::limits::{COURT_CAPACITY, INSTRUCTOR_CAPACITY};
use crate::model::*;

use super::EngineError;

/// Capacity admission for one slot. Pure; the caller holds the slot's
/// write lock so the count and the subsequent insert form one critical
/// section. Cancelled and no-show reservations don't count.
///
/// The two limits are independent: an instructor booking consumes one
/// unit of court capacity and one unit of instructor capacity at once.
pub fn check_admission(state: &SlotState, kind: ReservationKind) -> Result<(), EngineError> {
    let (total, instructor) = state.active_counts();
    if total >= COURT_CAPACITY {
        return Err(EngineError::CourtFull);
    }
    if kind == ReservationKind::WithInstructor && instructor >= INSTRUCTOR_CAPACITY {
        return Err(EngineError::InstructorBusy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use ulid::Ulid;

    fn state_with(entries: &[(ReservationKind, ReservationStatus)]) -> SlotState {
        let slot = Slot::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        );
        let mut state = SlotState::new(slot);
        for &(kind, status) in entries {
            state.insert(Reservation {
                id: Ulid::new(),
                slot,
                key: Ulid::new().to_string()[20..].to_string(),
                kind,
                status,
                client_id: Ulid::new(),
                staff_id: None,
                checked_in_at: None,
            });
        }
        state
    }

    use crate::model::ReservationKind::{Court, WithInstructor};
    use crate::model::ReservationStatus::{Cancelled, Confirmed, ConfirmedLate, NoShow, Pending};

    #[test]
    fn empty_slot_admits_both_kinds() {
        let state = state_with(&[]);
        assert!(check_admission(&state, Court).is_ok());
        assert!(check_admission(&state, WithInstructor).is_ok());
    }

    #[test]
    fn court_full_at_capacity() {
        let state = state_with(&[(Court, Pending), (WithInstructor, Confirmed)]);
        assert_eq!(check_admission(&state, Court), Err(EngineError::CourtFull));
        assert_eq!(
            check_admission(&state, WithInstructor),
            Err(EngineError::CourtFull)
        );
    }

    #[test]
    fn late_checkin_still_holds_capacity() {
        let state = state_with(&[(Court, ConfirmedLate), (Court, Pending)]);
        assert_eq!(check_admission(&state, Court), Err(EngineError::CourtFull));
    }

    #[test]
    fn cancelled_and_no_show_free_their_unit() {
        let state = state_with(&[(Court, Cancelled), (WithInstructor, NoShow), (Court, Pending)]);
        assert!(check_admission(&state, Court).is_ok());
        assert!(check_admission(&state, WithInstructor).is_ok());
    }

    #[test]
    fn instructor_units_are_tracked_separately() {
        // One instructor unit used, one court unit free: both kinds admit.
        let state = state_with(&[(WithInstructor, Pending)]);
        assert!(check_admission(&state, WithInstructor).is_ok());
        assert!(check_admission(&state, Court).is_ok());
    }
}
