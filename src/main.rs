//! Users service (v1)
//!
//! A user-management API built with Tokio and Axum that keeps serving while
//! its backends are down.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌────────────────────────────────────────────────────┐
//!                        │                   USERS SERVICE                     │
//!                        │                                                     │
//!     Client Request     │  ┌─────────┐    ┌─────────┐    ┌───────────────┐   │
//!     ───────────────────┼─▶│  http   │───▶│  gate   │───▶│  user store   │   │
//!                        │  │ server  │    │         │    └───────────────┘   │
//!                        │  └─────────┘    └────┬────┘                        │
//!                        │                      │ reads snapshot              │
//!                        │                      ▼                             │
//!                        │               ┌──────────────┐    ┌────────────┐   │
//!                        │               │ connectivity │◀───│ supervisor │◀──┼──── Datastore
//!                        │               │   registry   │◀───│ supervisor │◀──┼──── Cache
//!                        │               └──────────────┘    └────────────┘   │
//!                        │                                                     │
//!                        │  config · observability · lifecycle · admin         │
//!                        └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use users_service::config;
use users_service::lifecycle::signals::forward_signals;
use users_service::observability::{logging::init_logging, metrics::init_metrics};
use users_service::{HttpServer, Services, Shutdown};

#[derive(Parser)]
#[command(name = "users-service")]
#[command(about = "User management API with degraded-mode operation", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "USERS_SERVICE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config errors are fatal and reported before logging exists.
    let config = config::load(args.config.as_deref())?;

    init_logging(&config.observability);

    tracing::info!(
        name = %config.app.name,
        version = %config.app.version,
        environment = %config.app.environment,
        "users-service starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_retries = config.retries.max_retries,
        heartbeat_secs = config.cache.heartbeat_interval_secs,
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    forward_signals(shutdown.clone());

    let server = HttpServer::new(Services::new(config));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
