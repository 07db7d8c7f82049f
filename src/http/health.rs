//! Service banner and health endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::connectivity::{BackendKind, ConnectivitySnapshot};
use crate::health::HealthStatus;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
    pub version: String,
    pub backends: ConnectivitySnapshot,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub cache: &'static str,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let app = &state.services.config.app;
    let port = state
        .services
        .config
        .listener
        .port()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Html(format!(
        "<h2>{} v{}</h2>\n<p>Environment: <strong>{}</strong></p>\n<p>Port: {}</p>\n",
        app.name, app.version, app.environment, port
    ))
}

/// Always 200; the status field carries ok/degraded.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.services.registry.snapshot();
    let app = &state.services.config.app;

    Json(HealthResponse {
        status: HealthStatus::from_snapshot(&snapshot),
        timestamp: Utc::now(),
        environment: app.environment.clone(),
        version: app.version.clone(),
        backends: snapshot,
    })
}

/// Cache probe: 200 when the cache link is up, 503 otherwise.
///
/// A Disconnected cache is restarted as a side effect.
pub async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.services.gate.probe(BackendKind::Auxiliary);
    if cache.is_connected() {
        (StatusCode::OK, Json(PingResponse { status: "ok", cache: cache.as_str() }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PingResponse { status: "unavailable", cache: cache.as_str() }),
        )
    }
}
