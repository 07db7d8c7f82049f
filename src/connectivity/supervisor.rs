//! Connection supervisor.
//!
//! # State Transitions
//! ```text
//! Disconnected/Failed → Connecting: start()
//! Connecting → Connected:           attempt succeeds (attempt counter reset)
//! Connecting → Connecting:          attempt fails, attempt < max_retries (sleep backoff)
//! Connecting → Failed:              attempt fails, attempt >= max_retries
//! Connected → Disconnected:         check_link() ping fails
//! ```
//!
//! # Design Decisions
//! - The Connecting state is the lock: `start()` while Connecting or
//!   Connected is a no-op, so at most one attempt loop exists
//! - Every transition is published to the registry while holding the
//!   lifecycle lock, keeping per-kind publish order monotonic
//! - Failures never escape: they become attempt counts and state

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use chrono::Utc;
use tokio::time::{sleep, timeout};

use crate::connectivity::endpoint::redact;
use crate::connectivity::{
    BackendDriver, BackendKind, BackendStatus, ConnectError, ConnectionState, ConnectivityRegistry, Endpoint,
};
use crate::observability::metrics;
use crate::resilience::BackoffPolicy;

/// Tuning for one supervisor.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    /// Attempts before giving up (Failed).
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    /// Upper bound for a single connect attempt.
    pub attempt_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: BackoffPolicy::default(),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    state: ConnectionState,
    attempt: u32,
    last_error: Option<String>,
}

/// Drives one backend connection to Connected or Failed.
pub struct ConnectionSupervisor {
    kind: BackendKind,
    endpoint: Option<Endpoint>,
    descriptor: String,
    driver: Arc<dyn BackendDriver>,
    config: SupervisorConfig,
    registry: Arc<ConnectivityRegistry>,
    lifecycle: Mutex<Lifecycle>,
}

impl ConnectionSupervisor {
    /// Create a dormant supervisor (state Disconnected).
    ///
    /// An unparseable URL is not an error here: every attempt against it
    /// fails and the supervisor ends up Failed like any unreachable backend.
    pub fn new(
        kind: BackendKind,
        url: &str,
        driver: Arc<dyn BackendDriver>,
        config: SupervisorConfig,
        registry: Arc<ConnectivityRegistry>,
    ) -> Arc<Self> {
        let endpoint = match Endpoint::parse(url) {
            Ok(ep) => Some(ep),
            Err(e) => {
                tracing::warn!(backend = %kind, error = %e, "Backend endpoint is invalid");
                None
            }
        };

        Arc::new(Self {
            kind,
            endpoint,
            descriptor: redact(url),
            driver,
            config,
            registry,
            lifecycle: Mutex::new(Lifecycle::default()),
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Redacted endpoint descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Failed attempts since the last success or fresh start.
    pub fn attempt(&self) -> u32 {
        self.lock().attempt
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Begin connecting unless an attempt loop is running or the link is up.
    ///
    /// Returns `true` if a new attempt loop was spawned. Calling this after
    /// Failed resets the attempt counter and retries from scratch.
    pub fn start(self: &Arc<Self>) -> bool {
        {
            let mut lc = self.lock();
            if lc.state.is_active() {
                tracing::debug!(backend = %self.kind, state = %lc.state, "Start ignored");
                return false;
            }
            lc.attempt = 0;
            lc.last_error = None;
            self.transition(&mut lc, ConnectionState::Connecting);
        }

        tracing::info!(backend = %self.kind, endpoint = %self.descriptor, "Connecting to backend");
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            supervisor.run().await;
        });
        true
    }

    async fn run(self: Arc<Self>) {
        let max_retries = self.config.max_retries.max(1);

        loop {
            match self.attempt_once().await {
                Ok(()) => {
                    {
                        let mut lc = self.lock();
                        lc.attempt = 0;
                        lc.last_error = None;
                        self.transition(&mut lc, ConnectionState::Connected);
                    }

                    metrics::record_connect_attempt(self.kind, "success");
                    tracing::info!(backend = %self.kind, endpoint = %self.descriptor, "Backend connected");
                    return;
                }
                Err(e) => {
                    metrics::record_connect_attempt(self.kind, "failure");
                    let message = self.scrub(&e);

                    let attempt = {
                        let mut lc = self.lock();
                        lc.attempt += 1;
                        lc.last_error = Some(message.clone());
                        let next = if lc.attempt >= max_retries {
                            ConnectionState::Failed
                        } else {
                            // Still Connecting; republished so observers see the attempt count.
                            ConnectionState::Connecting
                        };
                        self.transition(&mut lc, next);
                        lc.attempt
                    };

                    if attempt >= max_retries {
                        tracing::error!(
                            backend = %self.kind,
                            endpoint = %self.descriptor,
                            attempts = attempt,
                            error = %message,
                            "Retry budget exhausted, backend marked failed"
                        );
                        return;
                    }

                    let delay = self.config.backoff.delay(attempt);
                    tracing::warn!(
                        backend = %self.kind,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "Backend connection attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn attempt_once(&self) -> Result<(), ConnectError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| ConnectError::InvalidEndpoint(self.descriptor.clone()))?;

        timeout(self.config.attempt_timeout, self.driver.connect(endpoint))
            .await
            .map_err(|_| ConnectError::Timeout(self.config.attempt_timeout))?
    }

    /// Probe an established link; mark Disconnected if it is gone.
    ///
    /// Does nothing unless Connected. Does not start a new attempt loop.
    pub async fn check_link(&self) -> ConnectionState {
        if self.state() != ConnectionState::Connected {
            return self.state();
        }

        let result = timeout(self.config.attempt_timeout, self.driver.ping())
            .await
            .map_err(|_| ConnectError::Timeout(self.config.attempt_timeout))
            .and_then(|r| r);

        let mut lc = self.lock();
        if let Err(e) = result {
            if lc.state == ConnectionState::Connected {
                let message = self.scrub(&e);
                tracing::warn!(backend = %self.kind, error = %message, "Backend link lost");
                lc.last_error = Some(message);
                self.transition(&mut lc, ConnectionState::Disconnected);
            }
        }
        lc.state
    }

    fn scrub(&self, error: &ConnectError) -> String {
        let message = error.to_string();
        match &self.endpoint {
            Some(ep) => ep.scrub(&message),
            None => message,
        }
    }

    fn transition(&self, lc: &mut Lifecycle, state: ConnectionState) {
        if lc.state != state {
            tracing::debug!(backend = %self.kind, from = %lc.state, to = %state, "Connection state change");
        }
        lc.state = state;
        self.registry.publish(BackendStatus {
            kind: self.kind,
            state,
            attempt: lc.attempt,
            endpoint: self.descriptor.clone(),
            last_error: lc.last_error.clone(),
            updated_at: Utc::now(),
        });
    }
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("kind", &self.kind)
            .field("endpoint", &self.descriptor)
            .field("state", &self.state())
            .finish()
    }
}
