//! StateLM scoring protocol.
//!
//! Three request/response calls against a scoring server that owns a
//! stateful, context-conditioned language model.
//!
//! ## Calls
//!
//! | Call           | Request                         | Response                     |
//! |----------------|---------------------------------|------------------------------|
//! | `GetScores`    | `state`, `context`              | `symbols`, `probabilities`   |
//! | `UpdateScores` | `state`, `utf8_sym`, `count`    | `symbols`, `probabilities`   |
//! | `GetNextState` | `state`, `context`              | `next_state`                 |
//!
//! ## States
//!
//! A state is an opaque server-issued handle ([`StateHandle`]). Two sentinels
//! exist by convention:
//!
//! | Handle | Meaning                                                   |
//! |--------|-----------------------------------------------------------|
//! | `-1`   | Unknown context: the request carries the whole context    |
//! | `0`    | Root: start of input, nothing consumed                    |
//!
//! ## Symbols
//!
//! Update requests carry a single codepoint; `0` marks end-of-string. Score
//! responses carry symbols as strings with `""` for end-of-string.

mod distribution;
mod message;
mod state;
mod symbol;

pub use distribution::ScoreDistribution;
pub use message::{ContextRequest, ErrorBody, ErrorCode, LmScores, NextState, UpdateRequest};
pub use state::StateHandle;
pub use symbol::{check_text, single_char, Symbol, END_OF_STRING};

/// Protocol version
pub const PROTOCOL_VERSION: &str = "1.0";

/// Route for `GetScores`.
pub const SCORES_PATH: &str = "/v1/scores";

/// Route for `UpdateScores`.
pub const UPDATE_PATH: &str = "/v1/update";

/// Route for `GetNextState`.
pub const NEXT_STATE_PATH: &str = "/v1/next_state";

/// Default operator-facing server address.
pub const DEFAULT_SERVER_ADDRESS: &str = "localhost:50051";
