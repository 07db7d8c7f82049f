//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{EnvOverrides, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load the effective configuration.
///
/// Starts from the TOML file when one is given (defaults otherwise), reads
/// `.env` if present, then overlays process environment variables.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    dotenvy::dotenv().ok();
    let overrides: EnvOverrides = envy::from_env()?;
    resolve(path, overrides)
}

fn resolve(path: Option<&Path>, overrides: EnvOverrides) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };
    config.apply_env(overrides);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
