use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::connectivity::{BackendKind, ConnectionState, ConnectivitySnapshot};
use crate::health::HealthStatus;
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: HealthStatus,
    pub users: usize,
}

#[derive(Serialize)]
pub struct ReconnectResponse {
    pub backend: BackendKind,
    /// True if a new attempt loop was started.
    pub started: bool,
    pub state: ConnectionState,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshot = state.services.registry.snapshot();
    Json(SystemStatus {
        version: state.services.config.app.version.clone(),
        status: HealthStatus::from_snapshot(&snapshot),
        users: state.services.store.len(),
    })
}

pub async fn get_backends(State(state): State<AppState>) -> Json<ConnectivitySnapshot> {
    Json(state.services.registry.snapshot())
}

/// Operator recovery path: restart a backend's connection attempts.
pub async fn reconnect(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ReconnectResponse>, ApiError> {
    let kind = kind
        .parse::<BackendKind>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let supervisor = state.services.supervisor(kind);

    let started = supervisor.start();
    tracing::info!(backend = %kind, started, "Operator reconnect requested");

    Ok(Json(ReconnectResponse {
        backend: kind,
        started,
        state: supervisor.state(),
    }))
}
