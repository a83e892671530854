use std::future::Future;
use std::time::Duration;

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// How long each dependency gets to answer the connection check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "footpulse-api"
    }))
}

#[derive(Debug, Serialize)]
pub struct ConnectionCheck {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionsReport {
    pub database: ConnectionCheck,
    pub llm: ConnectionCheck,
}

fn check<E: std::fmt::Display>(result: Result<(), E>, ok: String) -> ConnectionCheck {
    match result {
        Ok(()) => ConnectionCheck {
            success: true,
            message: ok,
        },
        Err(e) => ConnectionCheck {
            success: false,
            message: e.to_string(),
        },
    }
}

/// Runs one dependency ping, reporting a stalled dependency as unreachable.
async fn ping_within<E, F>(ping: F, ok: String) -> ConnectionCheck
where
    E: std::fmt::Display,
    F: Future<Output = Result<(), E>>,
{
    match tokio::time::timeout(CHECK_TIMEOUT, ping).await {
        Ok(result) => check(result, ok),
        Err(_) => ConnectionCheck {
            success: false,
            message: format!("No answer within {}s", CHECK_TIMEOUT.as_secs()),
        },
    }
}

/// GET /api/v1/system/connections
///
/// Always 200; each dependency reports its own status.
pub async fn handle_connections(State(state): State<AppState>) -> Json<ConnectionsReport> {
    let backend = state.analyzer.backend();
    let (database, llm) = tokio::join!(
        ping_within(state.store.ping(), "Database reachable".to_string()),
        ping_within(
            backend.ping(),
            format!("{} backend reachable", backend.name())
        ),
    );

    Json(ConnectionsReport { database, llm })
}
