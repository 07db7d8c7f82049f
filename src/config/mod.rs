//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → .env + process environment (envy overlay)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; the process starts with no configuration
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, ConfigError};
pub use schema::ServiceConfig;
pub use schema::{AdminConfig, AppConfig, BackendConfig, CacheConfig, EnvOverrides, ListenerConfig};
pub use schema::{ObservabilityConfig, RetryConfig, TimeoutConfig};
