//! StateLM error types.
//!
//! # Error Classification
//!
//! Errors fall into three families that callers treat differently:
//!
//! - **Protocol violations**: the server answered, but the answer breaks an
//!   invariant the client depends on (parallel sequences of different length,
//!   non-finite probabilities). The response cannot be trusted and is never
//!   retried.
//! - **Transport failures**: the server could not be reached or did not answer
//!   in time. Whether to retry is the caller's decision, but an interrupted
//!   walk must be abandoned since the outcome of the last call is unknown.
//! - **Rejections**: the server refused the request (`InvalidState`,
//!   `InvalidArgument`). Local validation produces `InvalidArgument` before a
//!   request is ever sent.

use thiserror::Error;

/// StateLM protocol errors.
#[derive(Error, Debug)]
pub enum StateLmError {
    /// Server response violates a protocol invariant.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Server does not recognise the state handle.
    #[error("Invalid state handle {state}: {message}")]
    InvalidState {
        /// Raw value of the rejected handle.
        state: i64,
        /// Server-supplied detail.
        message: String,
    },

    /// Request arguments rejected locally or by the server.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection-level failure (unreachable server, broken stream).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Call exceeded its deadline; the outcome on the server is unknown.
    #[error("Call timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Connection was closed before or during the call.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Server-side failure not covered by the other variants.
    #[error("Server error: {0}")]
    Server(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StateLmError {
    /// Whether this error is a transport failure with unknown server-side outcome.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout(_) | Self::ConnectionClosed
        )
    }

    /// Shorthand for the length-mismatch protocol violation.
    pub fn size_mismatch(symbols: usize, probabilities: usize) -> Self {
        Self::ProtocolViolation(format!(
            "symbol and probability sequences differ in length ({symbols} vs {probabilities})"
        ))
    }
}

/// Result type alias for StateLM operations
pub type Result<T> = std::result::Result<T, StateLmError>;

impl From<reqwest::Error> for StateLmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StateLmError::ProtocolViolation(format!("undecodable response: {err}"))
        } else {
            StateLmError::Transport(err.to_string())
        }
    }
}

impl From<toml::de::Error> for StateLmError {
    fn from(err: toml::de::Error) -> Self {
        StateLmError::Config(err.to_string())
    }
}
