//! Error types for the conformance harness
//!
//! Error messages are written to be actionable for whoever is bringing the
//! backend up, with hints on how to resolve common issues.

use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Reachability Errors ===
    #[error("{target} is unreachable: {reason}")]
    Unreachable { target: String, reason: String },

    #[error("{target} returned HTTP {status}")]
    HttpStatus { target: String, status: u16 },

    // === Protocol Errors ===
    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("WebSocket connection closed by the backend")]
    ConnectionClosed,

    #[error("Failed to send '{kind}' message: {reason}")]
    SendFailed { kind: String, reason: String },

    #[error("Malformed message from backend: {0}")]
    Decode(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    // === Scenario Errors ===
    #[error("Precondition unmet: {0}")]
    PreconditionUnmet(String),

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Persistence Errors ===
    #[error("No database configured. Set DATABASE_URL or pass --database-url")]
    DatabaseNotConfigured,

    #[error("Database error: {0}")]
    Persistence(String),

    #[error("{0} not found")]
    RecordNotFound(&'static str),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Run Outcome ===
    #[error("{failed} of {total} scenarios failed")]
    RunFailed { failed: usize, total: usize },

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unreachable error for a named endpoint
    pub fn unreachable(target: &str, reason: impl ToString) -> Self {
        Self::Unreachable {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a send failure for a message kind
    pub fn send_failed(kind: &str, reason: impl ToString) -> Self {
        Self::SendFailed {
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error into the failure taxonomy reported per scenario
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unreachable { .. } | Error::HttpStatus { .. } => ErrorKind::Unreachable,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::ConnectionClosed
            | Error::SendFailed { .. }
            | Error::Decode(_)
            | Error::UnexpectedResponse(_)
            | Error::ProtocolViolation(_)
            | Error::TestAssertion(_) => ErrorKind::ProtocolViolation,
            Error::DatabaseNotConfigured | Error::Persistence(_) | Error::RecordNotFound(_) => {
                ErrorKind::PersistenceError
            }
            Error::PreconditionUnmet(_) => ErrorKind::PreconditionUnmet,
            Error::Config(_) | Error::ConfigParse(_) | Error::FileRead { .. } => ErrorKind::Config,
            Error::Io(_) | Error::Json(_) | Error::Internal(_) | Error::RunFailed { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

/// Failure classification attached to a failed scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unreachable,
    Timeout,
    ProtocolViolation,
    PersistenceError,
    PreconditionUnmet,
    Config,
    Internal,
}

impl ErrorKind {
    /// Stable code used in JSON output
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unreachable => "UNREACHABLE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ProtocolViolation => "PROTOCOL_VIOLATION",
            ErrorKind::PersistenceError => "PERSISTENCE_ERROR",
            ErrorKind::PreconditionUnmet => "PRECONDITION_UNMET",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}
