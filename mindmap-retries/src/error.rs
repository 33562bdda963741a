//! Failure taxonomy for resilient calls.
//!
//! A single attempt fails with an [`AttemptError`]; a whole invocation fails
//! with a [`CallFailure`] whose [`FailureKind`] tells the caller what went
//! wrong without exposing transport internals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Longest upstream body excerpt kept in error messages.
const MAX_BODY_EXCERPT: usize = 512;

/// Classification of a failed attempt or call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never produced a response (timeout, reset, refused, DNS, TLS).
    TransientTransport,
    /// The upstream answered with a 5xx status.
    TransientServer,
    /// The upstream rejected the request (4xx or any other non-success status).
    PermanentClient,
    /// The response arrived but its body failed validation.
    MalformedResponse,
    /// The request could not be built or sent at all.
    InvalidRequest,
    /// The caller cancelled the call.
    Cancelled,
    /// The overall deadline passed.
    DeadlineExceeded,
}

impl FailureKind {
    /// Whether failures of this kind are worth retrying.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::TransientTransport | Self::TransientServer)
    }

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransientTransport => "transient_transport",
            Self::TransientServer => "transient_server",
            Self::PermanentClient => "permanent_client",
            Self::MalformedResponse => "malformed_response",
            Self::InvalidRequest => "invalid_request",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a transport before a response is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The attempt timed out.
    #[error("Timeout")]
    Timeout,

    /// Connection could not be established or was reset.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response body could not be read.
    #[error("Body read error: {0}")]
    Body(String),

    /// The request is not sendable (bad URL, bad header, bad method).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be constructed.
    #[error("Client configuration error: {0}")]
    Client(String),

    /// Other transport error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Failure kind for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) | Self::Client(_) => FailureKind::InvalidRequest,
            Self::Timeout | Self::Connection(_) | Self::Body(_) | Self::Other(_) => {
                FailureKind::TransientTransport
            }
        }
    }
}

/// Why a single attempt did not succeed.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// No response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The upstream returned a non-success status.
    #[error("HTTP error {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Excerpt of the response body.
        body: String,
    },

    /// A success status arrived with a body that failed validation.
    #[error("Malformed response (status {status}): {reason}")]
    Malformed {
        /// HTTP status code.
        status: u16,
        /// Why validation failed.
        reason: String,
    },
}

impl AttemptError {
    /// Create a status error, keeping only an excerpt of the body.
    pub fn status(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            body: excerpt(body),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(status: u16, reason: impl Into<String>) -> Self {
        Self::Malformed {
            status,
            reason: reason.into(),
        }
    }

    /// Failure kind for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(err) => err.kind(),
            Self::Status { status, .. } if (500..=599).contains(status) => {
                FailureKind::TransientServer
            }
            Self::Status { .. } => FailureKind::PermanentClient,
            Self::Malformed { .. } => FailureKind::MalformedResponse,
        }
    }

    /// HTTP status, if a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport(_) => None,
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
        }
    }

    /// Whether the default policy would retry this error.
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

/// Terminal failure of a whole invocation.
#[derive(Debug, Clone, Error)]
#[error("{kind} after {attempts} attempt(s): {message}")]
pub struct CallFailure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Human-readable detail of the last error.
    pub message: String,
    /// Attempts made before giving up.
    pub attempts: u32,
    /// HTTP status of the last response, if any.
    pub status: Option<u16>,
    /// Wall-clock time spent in the invocation.
    pub elapsed: Duration,
}

impl CallFailure {
    /// Create a failure.
    pub fn new(kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts,
            status: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Set the last HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    /// Set the elapsed time.
    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Whether the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}
