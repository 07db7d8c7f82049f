//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, span, metrics)
//!     → users.rs → gate (proceed / placeholder / 503) → user store
//!     → health.rs → registry snapshot
//!     → response.rs (error mapping, degraded header)
//!     → Send to client
//! ```

pub mod health;
pub mod request;
pub mod response;
pub mod server;
pub mod users;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, X_DEGRADED_MODE};
pub use server::{build_router, AppState, HttpServer};
