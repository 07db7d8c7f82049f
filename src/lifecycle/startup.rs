//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the registry and one supervisor per backend
//! - Kick off connection attempts without waiting for them
//! - Start the cache heartbeat
//!
//! # Design Decisions
//! - Backend unavailability never blocks or fails startup
//! - Drivers are injectable so tests can script backend behavior

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::connectivity::endpoint::redact;
use crate::connectivity::supervisor::SupervisorConfig;
use crate::connectivity::{
    BackendDriver, BackendKind, ConnectionSupervisor, ConnectivityRegistry, RespDriver, TcpProbeDriver,
};
use crate::gate::RequestGate;
use crate::health::{report_transitions, HealthStatus, HeartbeatMonitor};
use crate::resilience::BackoffPolicy;
use crate::users::UserStore;

/// Everything request handlers and background tasks share.
#[derive(Debug, Clone)]
pub struct Services {
    pub config: Arc<ServiceConfig>,
    pub registry: Arc<ConnectivityRegistry>,
    pub datastore: Arc<ConnectionSupervisor>,
    pub cache: Arc<ConnectionSupervisor>,
    pub gate: RequestGate,
    pub store: UserStore,
}

impl Services {
    /// Wire services with the real backend drivers.
    pub fn new(config: ServiceConfig) -> Self {
        let timeout = Duration::from_secs(config.timeouts.connect_secs);
        Self::with_drivers(
            config,
            Arc::new(TcpProbeDriver::new(timeout)),
            Arc::new(RespDriver::new(timeout)),
        )
    }

    pub fn with_drivers(
        config: ServiceConfig,
        datastore_driver: Arc<dyn BackendDriver>,
        cache_driver: Arc<dyn BackendDriver>,
    ) -> Self {
        let registry = Arc::new(ConnectivityRegistry::new(
            redact(&config.datastore.url),
            redact(&config.cache.url),
        ));

        let supervisor_config = SupervisorConfig {
            max_retries: config.retries.max_retries,
            backoff: BackoffPolicy::from_config(&config.retries),
            attempt_timeout: Duration::from_secs(config.timeouts.connect_secs),
        };

        let datastore = ConnectionSupervisor::new(
            BackendKind::Primary,
            &config.datastore.url,
            datastore_driver,
            supervisor_config,
            registry.clone(),
        );
        let cache = ConnectionSupervisor::new(
            BackendKind::Auxiliary,
            &config.cache.url,
            cache_driver,
            supervisor_config,
            registry.clone(),
        );

        let gate = RequestGate::new(registry.clone())
            .with_recovery(datastore.clone())
            .with_recovery(cache.clone());

        Self {
            config: Arc::new(config),
            registry,
            datastore,
            cache,
            gate,
            store: UserStore::new(),
        }
    }

    pub fn supervisor(&self, kind: BackendKind) -> &Arc<ConnectionSupervisor> {
        match kind {
            BackendKind::Primary => &self.datastore,
            BackendKind::Auxiliary => &self.cache,
        }
    }

    /// Start connecting to both backends. Returns immediately.
    pub fn connect_backends(&self) {
        for kind in BackendKind::ALL {
            self.supervisor(kind).start();
        }
    }

    /// Spawn the cache heartbeat task.
    pub fn spawn_heartbeat(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let monitor = HeartbeatMonitor::new(
            self.cache.clone(),
            Duration::from_secs(self.config.cache.heartbeat_interval_secs),
        );
        tokio::spawn(monitor.run(shutdown))
    }

    /// Spawn the task logging ok/degraded transitions.
    pub fn spawn_health_reporter(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<HealthStatus> {
        tokio::spawn(report_transitions(self.registry.clone(), shutdown))
    }
}
