use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A (date, time-of-day) pair that reservations compete for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// The single orderable instant this slot starts at.
    pub fn instant(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// What a reservation books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    /// Court only.
    Court,
    /// Court plus an instructor slot.
    WithInstructor,
}

/// Reservation lifecycle states. `cancelled` is terminal; `confirmed` and
/// `confirmed_late` are terminal for this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    ConfirmedLate,
    NoShow,
    Cancelled,
}

impl ReservationStatus {
    /// The client showed up, on time or late.
    pub fn is_attended(&self) -> bool {
        matches!(self, Self::Confirmed | Self::ConfirmedLate)
    }

    /// Counts against slot capacity. No-shows and cancellations free
    /// their unit.
    pub fn holds_capacity(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::ConfirmedLate)
    }
}

/// Client identity as submitted with a booking request. Each booking
/// creates a fresh client record; records are immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    /// National id document. Mutually optional with `passport`.
    pub national_id: Option<String>,
    pub passport: Option<String>,
}

/// A stored client record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Ulid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub nationality: String,
    pub national_id: Option<String>,
    pub passport: Option<String>,
}

impl NewClient {
    pub fn into_record(self, id: Ulid) -> Client {
        Client {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            birth_date: self.birth_date,
            nationality: self.nationality,
            national_id: self.national_id,
            passport: self.passport,
        }
    }
}

/// Age in whole years at `today`, by calendar comparison: the year
/// difference, minus one if this year's birthday hasn't arrived yet.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    use chrono::Datelike;
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

/// The central entity. Never physically deleted, only marked cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub slot: Slot,
    /// Short confirmation key, unique for the lifetime of the system.
    pub key: String,
    pub kind: ReservationKind,
    pub status: ReservationStatus,
    pub client_id: Ulid,
    /// Staff member who checked the client in. Set only at check-in.
    pub staff_id: Option<Ulid>,
    /// Set only at check-in.
    pub checked_in_at: Option<NaiveDateTime>,
}

/// All reservations competing for one slot. Guarded by a per-slot write
/// lock; the capacity count and the insert happen under the same guard.
#[derive(Debug)]
pub struct SlotState {
    pub slot: Slot,
    pub reservations: Vec<Reservation>,
}

impl SlotState {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            reservations: Vec::new(),
        }
    }

    pub fn insert(&mut self, reservation: Reservation) {
        self.reservations.push(reservation);
    }

    pub fn find_by_key_mut(&mut self, key: &str) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.key == key)
    }

    /// (total, with_instructor) counts of capacity-holding reservations.
    pub fn active_counts(&self) -> (usize, usize) {
        let mut total = 0;
        let mut instructor = 0;
        for r in &self.reservations {
            if r.status.holds_capacity() {
                total += 1;
                if r.kind == ReservationKind::WithInstructor {
                    instructor += 1;
                }
            }
        }
        (total, instructor)
    }
}

/// An operator who can check clients in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Ulid,
    pub name: String,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Instructor,
}

// ── Read-model rows ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub date: NaiveDate,
    pub time: String,
    pub kind: ReservationKind,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub key: String,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
    pub date: NaiveDate,
    pub time: String,
    pub first_name: String,
    pub last_name: String,
    pub checked_in_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub key: String,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
    pub date: NaiveDate,
    pub time: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub age: i32,
    pub checked_in_at: Option<NaiveDateTime>,
}

/// Attended-class counters for the staff dashboard, keyed on check-in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMetrics {
    pub attended_today: u64,
    pub attended_week: u64,
    pub court_only_week: u64,
}
