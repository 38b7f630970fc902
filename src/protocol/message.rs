//! Wire messages for the scoring protocol.
//!
//! Requests and responses are JSON bodies exchanged over HTTP. Field names
//! follow the logical call table: `state`, `context`, `utf8_sym`, `count`,
//! `symbols`, `probabilities`, `next_state`.

use serde::{Deserialize, Serialize};

use super::state::StateHandle;

/// Request for `GetScores` and `GetNextState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequest {
    /// Starting state (may be the unknown sentinel).
    pub state: StateHandle,
    /// Context interpreted relative to `state`.
    #[serde(default)]
    pub context: String,
}

/// Request for `UpdateScores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// State whose counts are updated.
    pub state: StateHandle,
    /// Observed symbol codepoint, 0 for end-of-string.
    pub utf8_sym: i32,
    /// Number of observations.
    pub count: i32,
}

/// Scores returned by `GetScores` and `UpdateScores`.
///
/// Parallel sequences as received; see
/// [`ScoreDistribution`](super::ScoreDistribution) for the validated form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LmScores {
    /// Candidate symbols, `""` for end-of-string.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Probability of each candidate.
    #[serde(default)]
    pub probabilities: Vec<f64>,
}

/// Response for `GetNextState`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextState {
    /// Handle reached after consuming the context.
    pub next_state: StateHandle,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

/// Error codes carried in [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// State handle not issued by this server.
    InvalidState,
    /// Malformed or out-of-range argument.
    InvalidArgument,
    /// Anything else.
    Internal,
}
