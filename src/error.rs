//! Error types for the arcade engine.
//!
//! Nothing here is fatal to the host: setup failures keep the controller
//! idle, and submission failures surface as an unacknowledged reward.

use thiserror::Error;

use crate::sim::SessionPhase;

/// Top-level error returned by the session controller.
#[derive(Error, Debug)]
pub enum ArcadeError {
    /// Join/submit transport or protocol failure
    #[error("Score service error: {0}")]
    Sync(#[from] SyncError),

    /// Illegal lifecycle transition
    #[error("Session error: {0}")]
    Phase(#[from] PhaseError),

    /// Session start refused at the boundary
    #[error("Play gate: {0}")]
    Gate(#[from] GateError),

    /// Invalid game configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors talking to the external session/score service.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or decoding failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Service explicitly refused the request
    #[error("Service rejected request: {0}")]
    Rejected(String),

    /// Service unreachable or not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Lifecycle state machine violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    #[error("cannot {action} while {from:?}")]
    InvalidTransition {
        from: SessionPhase,
        action: &'static str,
    },

    #[error("no active session")]
    NoSession,

    #[error("stale session token (generation {token}, current {current})")]
    StaleToken { token: u64, current: u64 },
}

/// Configuration parse and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Boundary checks consulted before a session may start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("daily play limit of {limit} reached")]
    DailyLimitReached { limit: u32 },
}
