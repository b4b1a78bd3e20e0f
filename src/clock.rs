//! 12-hour clock handling and the past-slot admission rule.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::engine::EngineError;
use crate::limits::{GRACE_MINUTES, PAST_TOLERANCE_MINUTES};

/// Parse a 12-hour clock string ("3:00 PM", "03:00 PM") into a time of
/// day. Hour 12 maps to zero before the AM/PM offset applies, so
/// "12:00 PM" is noon and "12:00 AM" is midnight; minutes pass through.
pub fn parse_clock(input: &str) -> Result<NaiveTime, EngineError> {
    NaiveTime::parse_from_str(input.trim(), "%I:%M %p")
        .map_err(|_| EngineError::InvalidTime(input.to_string()))
}

/// Inverse of [`parse_clock`]; used for timeline bucket labels.
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Reject bookings for slots already in the past. The tolerance absorbs
/// client/server clock skew and is not configurable per request.
pub fn ensure_bookable(instant: NaiveDateTime, now: NaiveDateTime) -> Result<(), EngineError> {
    if instant < now - Duration::minutes(PAST_TOLERANCE_MINUTES) {
        return Err(EngineError::PastSlot);
    }
    Ok(())
}

/// Instant after which an unattended pending reservation expires.
pub fn grace_deadline(instant: NaiveDateTime) -> NaiveDateTime {
    instant + Duration::minutes(GRACE_MINUTES)
}
