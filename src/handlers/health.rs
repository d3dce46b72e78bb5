use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use crate::router::VisionsState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// `connected`, `disconnected` or `not_configured`.
    pub database: &'static str,
    pub database_connected: bool,
    /// Seconds since the state was built.
    pub uptime: f64,
}

/// GET /health -> liveness; always 200, storage state reported in the body.
pub async fn health(State(state): State<VisionsState>) -> Json<HealthReport> {
    let (database, database_connected) = match state.repository() {
        Ok(repo) => {
            if repo.ping().await {
                ("connected", true)
            } else {
                ("disconnected", false)
            }
        }
        Err(_) => ("not_configured", false),
    };
    Json(HealthReport {
        status: "OK",
        timestamp: Utc::now(),
        database,
        database_connected,
        uptime: state.uptime().as_secs_f64(),
    })
}

/// GET / -> service banner.
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "Gambet API is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "visions": "/api/visions",
            "health": "/health"
        }
    }))
}
