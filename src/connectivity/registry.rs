//! Process-wide connectivity state.
//!
//! # Responsibilities
//! - Hold the latest published status per backend kind
//! - Serve lock-free reads to the gate, health checks and admin surface
//! - Notify observers that something changed
//!
//! # Design Decisions
//! - One `ArcSwap` cell per kind: single writer (the supervisor), many readers
//! - Last write wins; no coalescing
//! - Change notification is a version counter on a watch channel, so slow
//!   observers only ever see the newest version

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::connectivity::{BackendKind, ConnectionState};
use crate::observability::metrics;

/// Published status of one backend connection.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub kind: BackendKind,
    pub state: ConnectionState,
    /// Failed attempts since the last successful connect or fresh start.
    pub attempt: u32,
    /// Endpoint descriptor with credentials redacted.
    pub endpoint: String,
    /// Last failure, already scrubbed of credentials.
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl BackendStatus {
    /// Status of a backend that has not been started yet.
    pub fn initial(kind: BackendKind, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            state: ConnectionState::Disconnected,
            attempt: 0,
            endpoint: endpoint.into(),
            last_error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Immutable view of every backend at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivitySnapshot {
    #[serde(rename = "datastore")]
    pub primary: Arc<BackendStatus>,
    #[serde(rename = "cache")]
    pub auxiliary: Arc<BackendStatus>,
}

impl ConnectivitySnapshot {
    pub fn state(&self, kind: BackendKind) -> ConnectionState {
        match kind {
            BackendKind::Primary => self.primary.state,
            BackendKind::Auxiliary => self.auxiliary.state,
        }
    }
}

/// Authoritative source of connectivity per backend kind.
#[derive(Debug)]
pub struct ConnectivityRegistry {
    primary: ArcSwap<BackendStatus>,
    auxiliary: ArcSwap<BackendStatus>,
    version: watch::Sender<u64>,
}

impl ConnectivityRegistry {
    /// Create a registry with both backends Disconnected.
    pub fn new(primary_endpoint: impl Into<String>, auxiliary_endpoint: impl Into<String>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            primary: ArcSwap::from_pointee(BackendStatus::initial(BackendKind::Primary, primary_endpoint)),
            auxiliary: ArcSwap::from_pointee(BackendStatus::initial(BackendKind::Auxiliary, auxiliary_endpoint)),
            version,
        }
    }

    fn cell(&self, kind: BackendKind) -> &ArcSwap<BackendStatus> {
        match kind {
            BackendKind::Primary => &self.primary,
            BackendKind::Auxiliary => &self.auxiliary,
        }
    }

    /// Latest published state for `kind`. Never blocks.
    pub fn get(&self, kind: BackendKind) -> ConnectionState {
        self.cell(kind).load().state
    }

    /// Latest published status for `kind`.
    pub fn status(&self, kind: BackendKind) -> Arc<BackendStatus> {
        self.cell(kind).load_full()
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            primary: self.status(BackendKind::Primary),
            auxiliary: self.status(BackendKind::Auxiliary),
        }
    }

    /// Replace the status for `status.kind`.
    ///
    /// Only the owning supervisor should call this.
    pub fn publish(&self, status: BackendStatus) {
        let kind = status.kind;
        let state = status.state;
        self.cell(kind).store(Arc::new(status));
        metrics::record_backend_state(kind, state);
        self.version.send_modify(|v| *v += 1);
    }

    /// Receiver that changes whenever any backend publishes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(kind: BackendKind, state: ConnectionState) -> BackendStatus {
        BackendStatus {
            state,
            ..BackendStatus::initial(kind, "redis://localhost:6379")
        }
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let registry = ConnectivityRegistry::new("mongodb://a", "redis://b");
        assert_eq!(registry.get(BackendKind::Primary), ConnectionState::Disconnected);
        assert_eq!(registry.get(BackendKind::Auxiliary), ConnectionState::Disconnected);
    }

    #[test]
    fn test_publish_is_per_kind_last_write_wins() {
        let registry = ConnectivityRegistry::new("mongodb://a", "redis://b");
        registry.publish(status(BackendKind::Auxiliary, ConnectionState::Connecting));
        registry.publish(status(BackendKind::Auxiliary, ConnectionState::Connected));

        assert_eq!(registry.get(BackendKind::Auxiliary), ConnectionState::Connected);
        assert_eq!(registry.get(BackendKind::Primary), ConnectionState::Disconnected);
    }

    #[test]
    fn test_snapshot_is_immutable_view() {
        let registry = ConnectivityRegistry::new("mongodb://a", "redis://b");
        let before = registry.snapshot();
        registry.publish(status(BackendKind::Primary, ConnectionState::Failed));

        assert_eq!(before.state(BackendKind::Primary), ConnectionState::Disconnected);
        assert_eq!(registry.snapshot().state(BackendKind::Primary), ConnectionState::Failed);
    }

    #[test]
    fn test_snapshot_serializes_by_public_names() {
        let registry = ConnectivityRegistry::new("mongodb://a", "redis://b");
        registry.publish(status(BackendKind::Auxiliary, ConnectionState::Connected));

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["datastore"]["kind"], "datastore");
        assert_eq!(json["datastore"]["state"], "disconnected");
        assert_eq!(json["cache"]["state"], "connected");
        assert_eq!(json["cache"]["attempt"], 0);
    }

    #[tokio::test]
    async fn test_subscribe_observes_publish() {
        let registry = ConnectivityRegistry::new("mongodb://a", "redis://b");
        let mut rx = registry.subscribe();
        registry.publish(status(BackendKind::Primary, ConnectionState::Connecting));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
