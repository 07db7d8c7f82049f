//! Operator endpoints.
//!
//! Bearer-token protected; mounted only when `admin.enabled`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/backends", get(get_backends))
        .route("/admin/backends/{kind}/reconnect", post(reconnect))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
