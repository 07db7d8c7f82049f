//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build registry + supervisors → start() both
//!     → Heartbeat task → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, heartbeat exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Config errors are fatal; backend errors never are
//! - Connection attempts run in the background while the listener is already up

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Services;
