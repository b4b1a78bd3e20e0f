use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};

use tiebreak::auth::StaffDirectory;
use tiebreak::engine::Engine;
use tiebreak::model::StaffRole;
use tiebreak::wire;

// ── Test infrastructure ──────────────────────────────────────

async fn start_test_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let engine = Arc::new(Engine::new());
    let staff = Arc::new(StaffDirectory::new());
    staff.register("front-desk", "Front Desk", StaffRole::Instructor);

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let engine = engine.clone();
            let staff = staff.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, engine, staff).await;
            });
        }
    });

    addr
}

struct TestClient {
    framed: Framed<TcpStream, LinesCodec>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let socket = TcpStream::connect(addr).await.unwrap();
        Self {
            framed: Framed::new(socket, LinesCodec::new()),
        }
    }

    async fn roundtrip(&mut self, request: Value) -> Value {
        self.framed.send(request.to_string()).await.unwrap();
        let line = self.framed.next().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }
}

fn booking(first_name: &str, time: &str, kind: &str) -> Value {
    json!({
        "cmd": "create_reservation",
        "client": {
            "first_name": first_name,
            "last_name": "Campos",
            "phone": "7000-0000",
            "birth_date": "1990-01-01",
            "nationality": "SV",
            "national_id": "00000000-1",
            "passport": null,
        },
        // Far future so the wall clock never makes the slot stale.
        "date": "2030-06-01",
        "time": time,
        "kind": kind,
    })
}

// ── Scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn booking_lifecycle_over_the_wire() {
    let addr = start_test_server().await;
    let mut client = TestClient::connect(addr).await;

    // Book until the slot is full.
    let first = client.roundtrip(booking("Ana", "3:00 PM", "court")).await;
    assert_eq!(first["status"], "ok");
    let key = first["data"]["key"].as_str().unwrap().to_string();
    assert_eq!(key.len(), 6);

    let second = client
        .roundtrip(booking("Bruno", "3:00 PM", "with_instructor"))
        .await;
    assert_eq!(second["status"], "ok");

    let third = client.roundtrip(booking("Carla", "3:00 PM", "court")).await;
    assert_eq!(third["status"], "error");
    assert_eq!(third["code"], "court_full");

    // Cancel is single-shot.
    let cancel = client
        .roundtrip(json!({"cmd": "cancel_reservation", "key": key}))
        .await;
    assert_eq!(cancel["status"], "ok");
    let again = client
        .roundtrip(json!({"cmd": "cancel_reservation", "key": key}))
        .await;
    assert_eq!(again["code"], "not_found");

    // The freed unit admits an instructor booking.
    let fourth = client
        .roundtrip(booking("Diego", "3:00 PM", "with_instructor"))
        .await;
    assert_eq!(fourth["status"], "ok");
}

#[tokio::test]
async fn check_in_requires_staff_token() {
    let addr = start_test_server().await;
    let mut client = TestClient::connect(addr).await;

    let created = client.roundtrip(booking("Ana", "9:00 AM", "court")).await;
    let key = created["data"]["key"].as_str().unwrap().to_string();

    let denied = client
        .roundtrip(json!({"cmd": "check_in", "token": "wrong", "key": key}))
        .await;
    assert_eq!(denied["code"], "unauthorized");

    let checked = client
        .roundtrip(json!({"cmd": "check_in", "token": "front-desk", "key": key}))
        .await;
    assert_eq!(checked["status"], "ok");
    assert_eq!(checked["data"], "confirmed");

    let twice = client
        .roundtrip(json!({"cmd": "check_in", "token": "front-desk", "key": key}))
        .await;
    assert_eq!(twice["code"], "invalid_code");
}

#[tokio::test]
async fn pending_list_and_analytics_respond() {
    let addr = start_test_server().await;
    let mut client = TestClient::connect(addr).await;

    client.roundtrip(booking("Ana", "9:00 AM", "court")).await;
    client
        .roundtrip(booking("Bruno", "3:00 PM", "with_instructor"))
        .await;

    let pending = client
        .roundtrip(json!({"cmd": "list_pending", "token": "front-desk"}))
        .await;
    assert_eq!(pending["status"], "ok");
    let rows = pending["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["time"], "9:00 AM");
    assert_eq!(rows[0]["first_name"], "Ana");

    // Ranges bound the past only; the 2030 slots stay in view.
    let analytics = client
        .roundtrip(json!({"cmd": "analytics", "token": "front-desk", "range": "month"}))
        .await;
    assert_eq!(analytics["status"], "ok");
    assert_eq!(analytics["data"]["totals"]["reservations"], 2);
    assert_eq!(analytics["data"]["totals"]["pending"], 2);
    assert_eq!(analytics["data"]["totals"]["with_instructor"], 1);
    assert_eq!(analytics["data"]["timeline"][0]["label"], "2030-06-01");
}

#[tokio::test]
async fn malformed_lines_get_an_error_without_dropping_the_connection() {
    let addr = start_test_server().await;
    let mut client = TestClient::connect(addr).await;

    let garbage = client.roundtrip(json!({"cmd": "fly_me_to_the_moon"})).await;
    assert_eq!(garbage["status"], "error");
    assert_eq!(garbage["code"], "bad_request");

    // Still serving afterwards.
    let ok = client.roundtrip(booking("Ana", "9:00 AM", "court")).await;
    assert_eq!(ok["status"], "ok");
}
