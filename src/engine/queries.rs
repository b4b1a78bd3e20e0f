use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::clock;
use crate::limits::*;
use crate::model::*;

use super::Engine;

/// History filters. Typed data end to end; values are matched as
/// parameters, never spliced into query text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Case-insensitive substring over client names and confirmation keys.
    pub search: Option<String>,
    /// Inclusive scheduled-date bounds.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Engine {
    /// Pending reservations joined with client names, soonest first. The
    /// expiry sweep runs first so nothing overdue is reported as pending.
    pub async fn list_pending(&self, now: NaiveDateTime) -> Vec<PendingEntry> {
        self.sweep_expired(now).await;

        let mut rows: Vec<(NaiveDateTime, PendingEntry)> = Vec::new();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            for r in &guard.reservations {
                if r.status != ReservationStatus::Pending {
                    continue;
                }
                let Some(client) = self.ledger.client(&r.client_id) else {
                    continue;
                };
                rows.push((
                    r.slot.instant(),
                    PendingEntry {
                        date: r.slot.date,
                        time: clock::format_clock(r.slot.time),
                        kind: r.kind,
                        first_name: client.first_name,
                        last_name: client.last_name,
                    },
                ));
            }
        }
        rows.sort_by_key(|(instant, _)| *instant);
        rows.truncate(PENDING_LIST_LIMIT);
        rows.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Attended-class counters keyed on the check-in timestamp.
    pub async fn staff_metrics(&self, now: NaiveDateTime) -> StaffMetrics {
        let today = now.date();
        let week_start = today - Duration::days(WEEK_RANGE_DAYS);

        let mut metrics = StaffMetrics::default();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            for r in &guard.reservations {
                if !r.status.is_attended() {
                    continue;
                }
                let Some(arrived) = r.checked_in_at else {
                    continue;
                };
                let day = arrived.date();
                if day == today {
                    metrics.attended_today += 1;
                }
                if day >= week_start {
                    metrics.attended_week += 1;
                    if r.kind == ReservationKind::Court {
                        metrics.court_only_week += 1;
                    }
                }
            }
        }
        metrics
    }

    /// The most recently created reservations, newest first. Ulids embed
    /// their creation time, so the reservation id is the sort key.
    pub async fn recent_activity(&self) -> Vec<ActivityEntry> {
        let mut rows = Vec::new();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            for r in &guard.reservations {
                let Some(client) = self.ledger.client(&r.client_id) else {
                    continue;
                };
                rows.push((
                    r.id,
                    ActivityEntry {
                        key: r.key.clone(),
                        status: r.status,
                        kind: r.kind,
                        date: r.slot.date,
                        time: clock::format_clock(r.slot.time),
                        first_name: client.first_name,
                        last_name: client.last_name,
                        checked_in_at: r.checked_in_at,
                    },
                ));
            }
        }
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.truncate(ACTIVITY_LIMIT);
        rows.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Search the full ledger, newest scheduled first. Each row carries
    /// the client's age at `today`.
    pub async fn history(&self, query: &HistoryQuery, today: NaiveDate) -> Vec<HistoryEntry> {
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<(NaiveDateTime, HistoryEntry)> = Vec::new();
        for state in self.ledger.snapshot() {
            let guard = state.read().await;
            for r in &guard.reservations {
                if let Some(from) = query.from
                    && r.slot.date < from
                {
                    continue;
                }
                if let Some(to) = query.to
                    && r.slot.date > to
                {
                    continue;
                }
                let Some(client) = self.ledger.client(&r.client_id) else {
                    continue;
                };
                if let Some(needle) = &needle {
                    let hit = r.key.to_lowercase().contains(needle)
                        || client.first_name.to_lowercase().contains(needle)
                        || client.last_name.to_lowercase().contains(needle);
                    if !hit {
                        continue;
                    }
                }
                rows.push((
                    r.slot.instant(),
                    HistoryEntry {
                        key: r.key.clone(),
                        status: r.status,
                        kind: r.kind,
                        date: r.slot.date,
                        time: clock::format_clock(r.slot.time),
                        first_name: client.first_name,
                        last_name: client.last_name,
                        nationality: client.nationality,
                        age: age_on(client.birth_date, today),
                        checked_in_at: r.checked_in_at,
                    },
                ));
            }
        }
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.truncate(HISTORY_LIMIT);
        rows.into_iter().map(|(_, entry)| entry).collect()
    }
}
