//! Overall service health.
//!
//! # Aggregation
//! ```text
//! datastore Connected             → ok (cache state irrelevant)
//! datastore anything else         → degraded
//! ```
//!
//! # Design Decisions
//! - There is no "down": a live process always answers its health check
//! - Flips between ok and degraded are logged as they happen

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::connectivity::{BackendKind, ConnectivityRegistry, ConnectivitySnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

impl HealthStatus {
    pub fn from_snapshot(snapshot: &ConnectivitySnapshot) -> Self {
        if snapshot.state(BackendKind::Primary).is_connected() {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Degraded => "degraded",
        }
    }
}

/// Log every ok/degraded flip until shutdown. Returns the last status seen.
pub async fn report_transitions(
    registry: Arc<ConnectivityRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) -> HealthStatus {
    let mut changes = registry.subscribe();
    let mut current = HealthStatus::from_snapshot(&registry.snapshot());

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = HealthStatus::from_snapshot(&registry.snapshot());
                if next != current {
                    if next == HealthStatus::Ok {
                        tracing::info!(from = current.as_str(), to = next.as_str(), "Service health changed");
                    } else {
                        tracing::warn!(from = current.as_str(), to = next.as_str(), "Service health changed");
                    }
                    current = next;
                }
            }
            _ = shutdown.recv() => break,
        }
    }
    current
}
