//! Backend connectivity subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ConnectionSupervisor::start() (one per BackendKind)
//!     → supervisor.rs attempt loop (driver.connect, backoff on failure)
//!     → registry.rs publish (atomic swap per kind)
//!
//! Request handling:
//!     gate → registry.get(Primary) → proceed / degraded / 503
//!
//! Heartbeat (Auxiliary only):
//!     health::active ticker → supervisor.check_link() → driver.ping()
//!     → Disconnected on failure
//! ```
//!
//! # Design Decisions
//! - One generic supervisor, parameterized by kind, driver and backoff
//! - Registry entries have exactly one writer (their supervisor)
//! - Endpoint credentials are redacted before anything is published or logged

pub mod driver;
pub mod endpoint;
pub mod registry;
pub mod supervisor;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use driver::{BackendDriver, ConnectError, RespDriver, TcpProbeDriver};
pub use endpoint::Endpoint;
pub use registry::{BackendStatus, ConnectivityRegistry, ConnectivitySnapshot};
pub use supervisor::ConnectionSupervisor;

/// Which external dependency a supervisor manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    /// The authoritative datastore holding user records.
    #[serde(rename = "datastore")]
    Primary,
    /// The optional cache accelerator.
    #[serde(rename = "cache")]
    Auxiliary,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Primary, BackendKind::Auxiliary];

    /// Stable label used in logs, metrics and the HTTP surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Primary => "datastore",
            BackendKind::Auxiliary => "cache",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a backend name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend '{0}' (expected datastore or cache)")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" | "datastore" | "mongo" | "mongodb" => Ok(BackendKind::Primary),
            "auxiliary" | "cache" | "redis" => Ok(BackendKind::Auxiliary),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Connection lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// Retry budget exhausted; dormant until `start()` is called again.
    Failed = 3,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True while an attempt loop owns the supervisor (or the link is up).
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
