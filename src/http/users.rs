use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::gate::{Admission, Degraded, Operation};
use crate::http::response::{degraded, ApiError};
use crate::http::server::AppState;
use crate::users::{NewUser, UserUpdate};

fn serve_degraded(payload: Degraded) -> Response {
    match payload {
        Degraded::Users(users) => degraded(users),
        Degraded::User(user) => degraded(user),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.services.gate.admit(&Operation::List)? {
        Admission::Proceed => Ok(Json(state.services.store.list()).into_response()),
        Admission::Degraded(payload) => Ok(serve_degraded(payload)),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.services.gate.admit(&Operation::Get { id: id.clone() })? {
        Admission::Proceed => Ok(Json(state.services.store.get(&id)?).into_response()),
        Admission::Degraded(payload) => Ok(serve_degraded(payload)),
    }
}

// Mutations consult the gate before the body is looked at, so an outage
// answers 503 even for malformed requests.

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.services.gate.admit(&Operation::Create)?;
    let Json(new_user) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let user = state.services.store.create(new_user)?;
    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    state.services.gate.admit(&Operation::Update { id: id.clone() })?;
    let Json(update) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let user = state.services.store.update(&id, update)?;
    Ok(Json(user).into_response())
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.services.gate.admit(&Operation::Delete { id: id.clone() })?;

    let user = state.services.store.delete(&id)?;
    tracing::info!(user_id = %user.id, "User deleted");
    Ok(Json(json!({ "message": "User deleted", "user": user })).into_response())
}
