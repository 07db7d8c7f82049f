//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, retries > 0, base <= cap)
//! - Check that backend URLs are parseable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Errors never echo backend URLs verbatim (they may carry credentials)

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::connectivity::endpoint::{redact, Endpoint};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid {field} url '{url}': {reason}")]
    BackendUrl {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("retries.max_retries must be at least 1")]
    ZeroRetries,

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({cap})")]
    BackoffInverted { base: u64, cap: u64 },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("admin is enabled but admin.api_key is empty")]
    MissingAdminKey,

    #[error("unknown log format '{0}' (expected pretty or json)")]
    LogFormat(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for (field, url) in [("datastore", &config.datastore.url), ("cache", &config.cache.url)] {
        if let Err(e) = Endpoint::parse(url) {
            errors.push(ValidationError::BackendUrl {
                field,
                url: redact(url),
                reason: e.to_string(),
            });
        }
    }

    if config.retries.max_retries == 0 {
        errors.push(ValidationError::ZeroRetries);
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::BackoffInverted {
            base: config.retries.base_delay_ms,
            cap: config.retries.max_delay_ms,
        });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.cache.heartbeat_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue("cache.heartbeat_interval_secs"));
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::LogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
