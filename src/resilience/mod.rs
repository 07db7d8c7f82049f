//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend connect attempt fails:
//!     → supervisor increments attempt counter
//!     → backoff.rs (delay for that attempt, capped)
//!     → sleep, then next attempt (until the retry budget is spent)
//! ```
//!
//! # Design Decisions
//! - Delays are deterministic; one supervisor per backend means no herd to spread
//! - Timeouts are non-negotiable; every connect and ping has a deadline

pub mod backoff;

pub use backoff::BackoffPolicy;
