//! Request gating against datastore connectivity.
//!
//! # Decision Table (datastore state)
//! ```text
//!                          mutation             read
//! Connected                proceed              proceed
//! Connecting/Disconnected  ServiceUnavailable   placeholder data
//! Failed                   ServiceUnavailable   placeholder data
//! ```
//!
//! # Design Decisions
//! - Reads degrade, writes are rejected: placeholder reads cannot corrupt
//!   anything, faked writes would
//! - Cache state never affects data operations
//! - A Disconnected backend is nudged back into Connecting by the next
//!   request that consults it (data operations for the datastore, `/ping`
//!   for the cache); Failed waits for an operator reconnect

pub mod placeholder;

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::connectivity::{BackendKind, ConnectionState, ConnectionSupervisor, ConnectivityRegistry};
use crate::observability::metrics;
use crate::users::User;

/// A data operation against the datastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List,
    Get { id: String },
    Create,
    Update { id: String },
    Delete { id: String },
}

impl Operation {
    pub fn is_mutating(&self) -> bool {
        matches!(self, Operation::Create | Operation::Update { .. } | Operation::Delete { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Get { .. } => "get",
            Operation::Create => "create",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }

    /// Backend every data operation targets.
    pub fn backend(&self) -> BackendKind {
        BackendKind::Primary
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder payload for a degraded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degraded {
    Users(Vec<User>),
    User(User),
}

/// Outcome of a successful gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Run the operation against the live backend.
    Proceed,
    /// Serve this placeholder instead of touching the backend.
    Degraded(Degraded),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("{backend} unavailable ({state}); {operation} rejected")]
    ServiceUnavailable {
        backend: BackendKind,
        state: ConnectionState,
        operation: &'static str,
    },
}

/// Decides how an inbound operation is handled.
#[derive(Debug, Clone)]
pub struct RequestGate {
    registry: Arc<ConnectivityRegistry>,
    recovery: Vec<Arc<ConnectionSupervisor>>,
}

impl RequestGate {
    pub fn new(registry: Arc<ConnectivityRegistry>) -> Self {
        Self {
            registry,
            recovery: Vec::new(),
        }
    }

    /// Restart `supervisor` whenever the gate sees its backend Disconnected.
    pub fn with_recovery(mut self, supervisor: Arc<ConnectionSupervisor>) -> Self {
        self.recovery.retain(|s| s.kind() != supervisor.kind());
        self.recovery.push(supervisor);
        self
    }

    /// Current state of `kind`, restarting its supervisor if Disconnected.
    ///
    /// Returns the state observed before any restart.
    pub fn probe(&self, kind: BackendKind) -> ConnectionState {
        let state = self.registry.get(kind);
        self.recover(kind, state);
        state
    }

    fn recover(&self, kind: BackendKind, state: ConnectionState) {
        if state != ConnectionState::Disconnected {
            return;
        }
        if let Some(supervisor) = self.recovery.iter().find(|s| s.kind() == kind) {
            if supervisor.start() {
                tracing::info!(backend = %kind, "Reconnect triggered by incoming request");
            }
        }
    }

    pub fn admit(&self, op: &Operation) -> Result<Admission, GateError> {
        let backend = op.backend();
        let state = self.registry.get(backend);

        if state.is_connected() {
            metrics::record_gate_decision("proceed");
            return Ok(Admission::Proceed);
        }

        self.recover(backend, state);

        if op.is_mutating() {
            metrics::record_gate_decision("unavailable");
            tracing::warn!(backend = %backend, state = %state, operation = %op, "Rejecting write, backend unavailable");
            return Err(GateError::ServiceUnavailable {
                backend,
                state,
                operation: op.name(),
            });
        }

        metrics::record_gate_decision("degraded");
        tracing::debug!(backend = %backend, state = %state, operation = %op, "Serving placeholder data");
        let payload = match op {
            Operation::Get { id } => Degraded::User(placeholder::user(id)),
            _ => Degraded::Users(placeholder::user_list()),
        };
        Ok(Admission::Degraded(payload))
    }
}
