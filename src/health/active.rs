//! Active link checking.
//!
//! # Responsibilities
//! - Periodically ping the cache link while it is Connected
//! - Hand a failed ping to the supervisor (which marks it Disconnected)

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::connectivity::{ConnectionState, ConnectionSupervisor};

pub struct HeartbeatMonitor {
    supervisor: Arc<ConnectionSupervisor>,
    interval: Duration,
}

impl HeartbeatMonitor {
    pub fn new(supervisor: Arc<ConnectionSupervisor>, interval: Duration) -> Self {
        Self { supervisor, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            backend = %self.supervisor.kind(),
            interval_secs = self.interval.as_secs(),
            "Heartbeat monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.beat().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn beat(&self) {
        if self.supervisor.state() != ConnectionState::Connected {
            return;
        }
        let state = self.supervisor.check_link().await;
        if state != ConnectionState::Connected {
            tracing::warn!(
                backend = %self.supervisor.kind(),
                endpoint = %self.supervisor.descriptor(),
                "Heartbeat failed; waiting for reconnect"
            );
        }
    }
}
