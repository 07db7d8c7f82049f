//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, metrics)
//! - Start backend connections and the cache heartbeat
//! - Serve until the shutdown broadcast fires

use axum::{
    middleware,
    routing::get,
    Router,
};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::http::{health, request, users};
use crate::lifecycle::{Services, Shutdown};

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub services: Services,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(services: Services) -> Router {
    let config = services.config.clone();
    let state = AppState { services };

    let mut router = Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/ping", get(health::ping))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        );

    if config.admin.enabled {
        router = router.merge(setup_admin_router(state.clone()));
    }

    router
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn(request::track_metrics))
        .layer(request::propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(request::make_span))
        .layer(request::set_request_id_layer())
}

/// HTTP server for the users service.
pub struct HttpServer {
    router: Router,
    services: Services,
}

impl HttpServer {
    pub fn new(services: Services) -> Self {
        let router = build_router(services.clone());
        Self { router, services }
    }

    /// Start backend connections, then serve until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        // Connection attempts run in the background; the listener is
        // already accepting while they retry.
        self.services.connect_backends();
        let heartbeat = self.services.spawn_heartbeat(shutdown.subscribe());
        let reporter = self.services.spawn_health_reporter(shutdown.subscribe());

        let mut signal = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = signal.recv().await;
            })
            .await?;

        let _ = heartbeat.await;
        if let Ok(status) = reporter.await {
            tracing::info!(status = status.as_str(), "Final service health");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
