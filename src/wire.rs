use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};

use crate::auth::StaffDirectory;
use crate::engine::{AnalyticsFilters, AnalyticsRange, Engine, EngineError, HistoryQuery};
use crate::limits::MAX_LINE_LEN;
use crate::model::*;
use crate::observability;

/// One command per line, JSON-encoded. Booking and cancellation are
/// public; everything else carries a staff token.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    CreateReservation {
        client: NewClient,
        date: NaiveDate,
        time: String,
        kind: ReservationKind,
    },
    CancelReservation {
        key: String,
    },
    CheckIn {
        token: String,
        key: String,
    },
    ListPending {
        token: String,
    },
    Metrics {
        token: String,
    },
    Activity {
        token: String,
    },
    History {
        token: String,
        #[serde(flatten)]
        query: HistoryQuery,
    },
    Analytics {
        token: String,
        range: AnalyticsRange,
        #[serde(default)]
        kind: Option<ReservationKind>,
        #[serde(default)]
        status: Option<ReservationStatus>,
    },
}

impl Request {
    fn token(&self) -> Option<&str> {
        match self {
            Request::CreateReservation { .. } | Request::CancelReservation { .. } => None,
            Request::CheckIn { token, .. }
            | Request::ListPending { token }
            | Request::Metrics { token }
            | Request::Activity { token }
            | Request::History { token, .. }
            | Request::Analytics { token, .. } => Some(token),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

impl Reply {
    fn ok(data: impl Serialize) -> Reply {
        match serde_json::to_value(data) {
            Ok(value) => Reply::Ok { data: Some(value) },
            Err(e) => Reply::error("internal", format!("encoding failure: {e}")),
        }
    }

    fn ok_empty() -> Reply {
        Reply::Ok { data: None }
    }

    fn error(code: &'static str, message: impl Into<String>) -> Reply {
        Reply::Error {
            code,
            message: message.into(),
        }
    }

    fn status_label(&self) -> &'static str {
        match self {
            Reply::Ok { .. } => "ok",
            Reply::Error { .. } => "error",
        }
    }
}

impl From<EngineError> for Reply {
    fn from(e: EngineError) -> Reply {
        Reply::error(e.code(), e.to_string())
    }
}

fn engine_result(result: Result<impl Serialize, EngineError>) -> Reply {
    match result {
        Ok(data) => Reply::ok(data),
        Err(e) => e.into(),
    }
}

async fn execute(engine: &Engine, staff: &StaffDirectory, request: Request) -> Reply {
    let now = Local::now().naive_local();

    let staff_member = match request.token() {
        Some(token) => match staff.verify_token(token) {
            Some(member) => Some(member),
            None => {
                metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
                return Reply::error("unauthorized", "staff token not recognized");
            }
        },
        None => None,
    };

    match request {
        Request::CreateReservation {
            client,
            date,
            time,
            kind,
        } => engine_result(
            engine
                .create_reservation(client, date, &time, kind, now)
                .await,
        ),
        Request::CancelReservation { key } => match engine.cancel_reservation(&key).await {
            Ok(()) => Reply::ok_empty(),
            Err(e) => e.into(),
        },
        Request::CheckIn { key, .. } => {
            let Some(member) = staff_member else {
                return Reply::error("unauthorized", "staff token required");
            };
            engine_result(engine.check_in(&key, member.id, now).await)
        }
        Request::ListPending { .. } => Reply::ok(engine.list_pending(now).await),
        Request::Metrics { .. } => Reply::ok(engine.staff_metrics(now).await),
        Request::Activity { .. } => Reply::ok(engine.recent_activity().await),
        Request::History { query, .. } => Reply::ok(engine.history(&query, now.date()).await),
        Request::Analytics {
            range,
            kind,
            status,
            ..
        } => {
            // The aggregator itself is read-only; accuracy comes from
            // sweeping here first.
            engine.sweep_expired(now).await;
            Reply::ok(
                engine
                    .analytics(range, AnalyticsFilters { kind, status }, now)
                    .await,
            )
        }
    }
}

/// Serve one client connection until EOF. Malformed lines get an error
/// reply; the connection stays open.
pub async fn process_connection(
    socket: TcpStream,
    engine: Arc<Engine>,
    staff: Arc<StaffDirectory>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut framed = Framed::new(socket, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    while let Some(line) = framed.next().await {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                let label = observability::command_label(&request);
                let start = Instant::now();
                let reply = execute(&engine, &staff, request).await;
                metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
                    .record(start.elapsed().as_secs_f64());
                metrics::counter!(
                    observability::COMMANDS_TOTAL,
                    "command" => label,
                    "status" => reply.status_label()
                )
                .increment(1);
                reply
            }
            Err(e) => Reply::error("bad_request", format!("unparseable request: {e}")),
        };

        framed.send(serde_json::to_string(&reply)?).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decodes_from_json() {
        let line = r#"{"cmd":"create_reservation","client":{"first_name":"Ana","last_name":"Campos","phone":"7000-0000","birth_date":"1990-01-01","nationality":"SV","national_id":null,"passport":"X123"},"date":"2025-06-01","time":"3:00 PM","kind":"with_instructor"}"#;
        let request: Request = serde_json::from_str(line).unwrap();
        match request {
            Request::CreateReservation { client, date, time, kind } => {
                assert_eq!(client.first_name, "Ana");
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
                assert_eq!(time, "3:00 PM");
                assert_eq!(kind, ReservationKind::WithInstructor);
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[test]
    fn history_filters_flatten() {
        let line = r#"{"cmd":"history","token":"t","search":"ana","from":"2025-06-01"}"#;
        let request: Request = serde_json::from_str(line).unwrap();
        match request {
            Request::History { query, .. } => {
                assert_eq!(query.search.as_deref(), Some("ana"));
                assert!(query.from.is_some());
                assert!(query.to.is_none());
            }
            other => panic!("decoded wrong variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn staff_commands_require_a_known_token() {
        let engine = Engine::new();
        let staff = StaffDirectory::new();
        let reply = execute(
            &engine,
            &staff,
            Request::ListPending {
                token: "nope".into(),
            },
        )
        .await;
        match reply {
            Reply::Error { code, .. } => assert_eq!(code, "unauthorized"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn error_reply_shape() {
        let reply = Reply::from(EngineError::CourtFull);
        let json = serde_json::to_string(&reply).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"code\":\"court_full\""));
    }
}
