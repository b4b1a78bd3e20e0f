//! Hard limits and fixed policy constants. Everything tunable lives here.

/// Max non-cancelled reservations per (date, time) slot, any kind.
pub const COURT_CAPACITY: usize = 2;

/// Max `with_instructor` reservations per slot. Independent sub-limit;
/// an instructor booking consumes one unit of both.
pub const INSTRUCTOR_CAPACITY: usize = 2;

/// Minutes after the scheduled time during which a pending reservation
/// may still be honored before it expires to no_show.
pub const GRACE_MINUTES: i64 = 15;

/// Clock-skew tolerance when rejecting bookings for past slots: a slot is
/// bookable as long as its instant is not older than now minus this.
pub const PAST_TOLERANCE_MINUTES: i64 = 5;

/// Confirmation key length in characters.
pub const KEY_LEN: usize = 6;

/// Attempts at generating a collision-free confirmation key before the
/// request fails with an internal error.
pub const MAX_KEY_ATTEMPTS: usize = 16;

/// Max length for client/staff name fields, nationality, and id documents.
pub const MAX_NAME_LEN: usize = 128;

/// Max length for a client phone number.
pub const MAX_PHONE_LEN: usize = 32;

/// Rows returned by the pending-class listing.
pub const PENDING_LIST_LIMIT: usize = 20;

/// Rows returned by the recent-activity feed.
pub const ACTIVITY_LIMIT: usize = 10;

/// Rows returned by a history search.
pub const HISTORY_LIMIT: usize = 100;

/// Days covered by the `week` analytics range.
pub const WEEK_RANGE_DAYS: i64 = 7;

/// Days covered by the `month` analytics range.
pub const MONTH_RANGE_DAYS: i64 = 30;

/// Max bytes in a single wire request line.
pub const MAX_LINE_LEN: usize = 64 * 1024;
