use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::info;

use tiebreak::auth::StaffDirectory;
use tiebreak::engine::Engine;
use tiebreak::model::StaffRole;
use tiebreak::wire;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("TIEBREAK_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    tiebreak::observability::init(metrics_port);

    let port = std::env::var("TIEBREAK_PORT").unwrap_or_else(|_| "4810".into());
    let bind = std::env::var("TIEBREAK_BIND").unwrap_or_else(|_| "0.0.0.0".into());
    let max_connections: usize = std::env::var("TIEBREAK_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);
    let admin_token =
        std::env::var("TIEBREAK_ADMIN_TOKEN").unwrap_or_else(|_| "tiebreak-admin".into());
    let instructor_token =
        std::env::var("TIEBREAK_INSTRUCTOR_TOKEN").unwrap_or_else(|_| "tiebreak-court".into());

    let staff = Arc::new(StaffDirectory::new());
    staff.register(&admin_token, "Administrator", StaffRole::Admin);
    staff.register(&instructor_token, "Head Instructor", StaffRole::Instructor);

    let engine = Arc::new(Engine::new());
    let semaphore = Arc::new(Semaphore::new(max_connections));

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("tiebreak listening on {addr}");
    info!("  max_connections: {max_connections}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    // Graceful shutdown: stop accepting on SIGTERM/ctrl-c, drain in-flight connections
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
        }
    };
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (socket, peer) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!("accept error: {e}");
                        continue;
                    }
                };

                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        tracing::warn!("connection limit reached, rejecting {peer}");
                        metrics::counter!(tiebreak::observability::CONNECTIONS_REJECTED_TOTAL).increment(1);
                        drop(socket);
                        continue;
                    }
                };

                info!("connection from {peer}");
                metrics::counter!(tiebreak::observability::CONNECTIONS_TOTAL).increment(1);
                metrics::gauge!(tiebreak::observability::CONNECTIONS_ACTIVE).increment(1.0);
                let engine = engine.clone();
                let staff = staff.clone();

                tokio::spawn(async move {
                    let _permit = permit; // held until connection closes
                    if let Err(e) = wire::process_connection(socket, engine, staff).await {
                        tracing::error!("connection error from {peer}: {e}");
                    }
                    metrics::gauge!(tiebreak::observability::CONNECTIONS_ACTIVE).decrement(1.0);
                });
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    // Wait for in-flight connections to finish (up to 10s)
    info!("draining connections...");
    let drain_deadline = tokio::time::sleep(std::time::Duration::from_secs(10));
    tokio::pin!(drain_deadline);

    loop {
        if semaphore.available_permits() == max_connections {
            info!("all connections drained");
            break;
        }
        tokio::select! {
            _ = &mut drain_deadline => {
                let remaining = max_connections - semaphore.available_permits();
                tracing::warn!("drain timeout, {remaining} connections still open");
                break;
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(100)) => {}
        }
    }

    info!("tiebreak stopped");
    Ok(())
}
