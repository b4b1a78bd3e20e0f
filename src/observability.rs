use std::net::SocketAddr;

use crate::wire::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const COMMANDS_TOTAL: &str = "tiebreak_commands_total";

/// Histogram: command latency in seconds. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "tiebreak_command_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "tiebreak_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "tiebreak_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "tiebreak_connections_rejected_total";

/// Counter: staff-token verification failures.
pub const AUTH_FAILURES_TOTAL: &str = "tiebreak_auth_failures_total";

// ── Lifecycle metrics ───────────────────────────────────────────

/// Counter: reservations admitted and created.
pub const RESERVATIONS_CREATED_TOTAL: &str = "tiebreak_reservations_created_total";

/// Counter: reservations cancelled by key.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "tiebreak_reservations_cancelled_total";

/// Counter: check-ins, on time or late.
pub const CHECKINS_TOTAL: &str = "tiebreak_checkins_total";

/// Counter: pending reservations expired to no_show by the sweep.
pub const SWEEP_EXPIRED_TOTAL: &str = "tiebreak_sweep_expired_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Request variant to a short label for metrics.
pub fn command_label(request: &Request) -> &'static str {
    match request {
        Request::CreateReservation { .. } => "create_reservation",
        Request::CancelReservation { .. } => "cancel_reservation",
        Request::CheckIn { .. } => "check_in",
        Request::ListPending { .. } => "list_pending",
        Request::Metrics { .. } => "metrics",
        Request::Activity { .. } => "activity",
        Request::History { .. } => "history",
        Request::Analytics { .. } => "analytics",
    }
}
