//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so the process starts with no configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the users service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Application identity reported by `/` and `/health`.
    pub app: AppConfig,

    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Primary backend (document store).
    pub datastore: BackendConfig,

    /// Auxiliary backend (cache).
    pub cache: CacheConfig,

    /// Connection retry configuration, shared by both backends.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Operator endpoints.
    pub admin: AdminConfig,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// Deployment environment label (development, test, production).
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "users-service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_size: 1024 * 1024,
        }
    }
}

impl ListenerConfig {
    /// Port component of the bind address, if it has one.
    pub fn port(&self) -> Option<u16> {
        self.bind_address.rsplit_once(':').and_then(|(_, p)| p.parse().ok())
    }
}

/// Primary backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Connection URL; may carry credentials (never logged).
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017/users".to_string(),
        }
    }
}

/// Auxiliary backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Connection URL; may carry credentials (never logged).
    pub url: String,

    /// Seconds between heartbeat pings on an established link.
    pub heartbeat_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            heartbeat_interval_secs: 10,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Failed attempts before a backend is marked failed.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connect/ping timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin/*` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

/// Environment overrides, read with `envy`.
///
/// Variable names follow the conventional container env (`PORT`,
/// `MONGODB_URI`, `REDIS_URL`, ...).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub mongodb_uri: Option<String>,
    pub redis_url: Option<String>,
    pub db_max_retries: Option<u32>,
    pub db_backoff_base_ms: Option<u64>,
    pub db_backoff_cap_ms: Option<u64>,
    pub db_connect_timeout_secs: Option<u64>,
    pub cache_heartbeat_secs: Option<u64>,
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    pub app_env: Option<String>,
    pub admin_api_key: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub metrics_enabled: Option<bool>,
}

impl ServiceConfig {
    /// Overlay environment values onto this configuration.
    pub fn apply_env(&mut self, env: EnvOverrides) {
        if env.host.is_some() || env.port.is_some() {
            let (cur_host, cur_port) = self
                .listener
                .bind_address
                .rsplit_once(':')
                .map(|(h, p)| (h.to_string(), p.to_string()))
                .unwrap_or_else(|| (self.listener.bind_address.clone(), "3000".to_string()));
            let host = env.host.unwrap_or(cur_host);
            let port = env.port.map(|p| p.to_string()).unwrap_or(cur_port);
            self.listener.bind_address = format!("{}:{}", host, port);
        }
        if let Some(v) = env.mongodb_uri {
            self.datastore.url = v;
        }
        if let Some(v) = env.redis_url {
            self.cache.url = v;
        }
        if let Some(v) = env.db_max_retries {
            self.retries.max_retries = v;
        }
        if let Some(v) = env.db_backoff_base_ms {
            self.retries.base_delay_ms = v;
        }
        if let Some(v) = env.db_backoff_cap_ms {
            self.retries.max_delay_ms = v;
        }
        if let Some(v) = env.db_connect_timeout_secs {
            self.timeouts.connect_secs = v;
        }
        if let Some(v) = env.cache_heartbeat_secs {
            self.cache.heartbeat_interval_secs = v;
        }
        if let Some(v) = env.app_name {
            self.app.name = v;
        }
        if let Some(v) = env.app_version {
            self.app.version = v;
        }
        if let Some(v) = env.app_env {
            self.app.environment = v;
        }
        if let Some(v) = env.admin_api_key {
            self.admin.enabled = true;
            self.admin.api_key = v;
        }
        if let Some(v) = env.log_level {
            self.observability.log_level = v;
        }
        if let Some(v) = env.log_format {
            self.observability.log_format = v;
        }
        if let Some(v) = env.metrics_enabled {
            self.observability.metrics_enabled = v;
        }
    }
}
