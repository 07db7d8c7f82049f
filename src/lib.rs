//! Users service library: user CRUD over HTTP with supervised backend
//! connections and a degraded-mode request gate.

pub mod admin;
pub mod config;
pub mod connectivity;
pub mod gate;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod users;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{Services, Shutdown};
