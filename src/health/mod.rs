//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active checks (active.rs):
//!     Periodic timer
//!     → Ping the cache link if Connected
//!     → supervisor marks Disconnected on failure
//!
//! Aggregation (state.rs):
//!     ConnectivitySnapshot → ok | degraded
//!     registry change notifications → log each flip
//! ```
//!
//! # Design Decisions
//! - Only the cache has a heartbeat; the datastore relies on connect-time failure
//! - Health is derived from the registry, never stored separately

pub mod active;
pub mod state;

pub use active::HeartbeatMonitor;
pub use state::{report_transitions, HealthStatus};
