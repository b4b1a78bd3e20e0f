use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::limits::{MONTH_RANGE_DAYS, WEEK_RANGE_DAYS};
use crate::model::*;

use super::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsRange {
    /// Buckets by time of day.
    Today,
    /// Last 7 days onward, buckets by date.
    Week,
    /// Last 30 days onward, buckets by date.
    Month,
}

impl AnalyticsRange {
    fn contains(self, today: NaiveDate, date: NaiveDate) -> bool {
        match self {
            AnalyticsRange::Today => date == today,
            AnalyticsRange::Week => date >= today - Duration::days(WEEK_RANGE_DAYS),
            AnalyticsRange::Month => date >= today - Duration::days(MONTH_RANGE_DAYS),
        }
    }
}

/// Optional closed-enum filters; cancelled is always excluded regardless.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AnalyticsFilters {
    pub kind: Option<ReservationKind>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsTotals {
    pub reservations: u64,
    pub confirmed: u64,
    pub confirmed_late: u64,
    pub no_show: u64,
    pub pending: u64,
    pub with_instructor: u64,
}

impl AnalyticsTotals {
    fn tally(&mut self, reservation: &Reservation) {
        self.reservations += 1;
        match reservation.status {
            ReservationStatus::Confirmed => self.confirmed += 1,
            ReservationStatus::ConfirmedLate => self.confirmed_late += 1,
            ReservationStatus::NoShow => self.no_show += 1,
            ReservationStatus::Pending => self.pending += 1,
            ReservationStatus::Cancelled => {}
        }
        if reservation.kind == ReservationKind::WithInstructor {
            self.with_instructor += 1;
        }
    }

    fn add(&mut self, other: &AnalyticsTotals) {
        self.reservations += other.reservations;
        self.confirmed += other.confirmed;
        self.confirmed_late += other.confirmed_late;
        self.no_show += other.no_show;
        self.pending += other.pending;
        self.with_instructor += other.with_instructor;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub label: String,
    #[serde(flatten)]
    pub totals: AnalyticsTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub timeline: Vec<TimelineBucket>,
    pub totals: AnalyticsTotals,
}

/// Aggregate reservation rows into a bucketed timeline plus range totals.
/// Bucket key is the time of day for a today range, else the date.
pub fn aggregate<'a>(
    rows: impl IntoIterator<Item = &'a Reservation>,
    range: AnalyticsRange,
    filters: AnalyticsFilters,
    today: NaiveDate,
) -> AnalyticsReport {
    let mut buckets: BTreeMap<(NaiveDate, Option<NaiveTime>), AnalyticsTotals> = BTreeMap::new();

    for reservation in rows {
        if reservation.status == ReservationStatus::Cancelled {
            continue;
        }
        if !range.contains(today, reservation.slot.date) {
            continue;
        }
        if let Some(kind) = filters.kind
            && reservation.kind != kind
        {
            continue;
        }
        if let Some(status) = filters.status
            && reservation.status != status
        {
            continue;
        }

        let key = match range {
            AnalyticsRange::Today => (reservation.slot.date, Some(reservation.slot.time)),
            _ => (reservation.slot.date, None),
        };
        buckets.entry(key).or_default().tally(reservation);
    }

    let mut totals = AnalyticsTotals::default();
    let timeline = buckets
        .into_iter()
        .map(|((date, time), bucket)| {
            totals.add(&bucket);
            TimelineBucket {
                label: match time {
                    Some(time) => clock::format_clock(time),
                    None => date.to_string(),
                },
                totals: bucket,
            }
        })
        .collect();

    AnalyticsReport { timeline, totals }
}

impl Engine {
    /// Derive the report from the current ledger. Read-only; callers run
    /// the expiry sweep first when they need up-to-date statuses.
    pub async fn analytics(
        &self,
        range: AnalyticsRange,
        filters: AnalyticsFilters,
        now: NaiveDateTime,
    ) -> AnalyticsReport {
        let mut rows = Vec::new();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            rows.extend(guard.reservations.iter().cloned());
        }
        aggregate(rows.iter(), range, filters, now.date())
    }
}
