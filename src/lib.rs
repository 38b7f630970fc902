//! # statelm - Stateful Language Model Scoring
//!
//! Client for a remote character-level language model that keeps adaptive
//! state on the server. A caller can:
//!
//! - **Score**: ask for the distribution over next symbols after a context
//! - **Update**: add observed symbol counts at a state, adapting the model
//! - **Advance**: map a state and a context increment to a new state
//!
//! Built on top of those calls:
//!
//! - **Incremental walk**: feed a string into the model one character at a
//!   time, then read the updated distribution at the root
//! - **Ranking**: order candidates by descending probability
//! - **Tasks**: k-best continuations, random generation, adaptive bits per
//!   character
//!
//! ## Protocol Overview
//!
//! States are opaque integer handles issued by the server. Handle `0` is the
//! start state, `-1` means "unknown" and asks the server to interpret the
//! context from the start. End-of-string is codepoint `0` in update requests
//! and the empty string in score responses.
//!
//! ```text
//! Client                                   Server
//!    |                                        |
//!    |--- Update(state, 'a', 1) ------------->|  counts at state
//!    |<-- distribution -----------------------|
//!    |--- Advance(state, "a") --------------->|
//!    |<-- next_state -------------------------|
//!    |          ... one pair per char ...     |
//!    |--- Update(final, EOS, 1) ------------->|
//!    |<-- distribution -----------------------|
//!    |--- Score(0, "") ---------------------->|
//!    |<-- root distribution ------------------|
//! ```
//!
//! ### Wire Format
//!
//! | Call    | Endpoint              | Request                          | Response                       |
//! |---------|-----------------------|----------------------------------|--------------------------------|
//! | Score   | `POST /v1/scores`     | `{state, context}`               | `{symbols, probabilities}`     |
//! | Update  | `POST /v1/update`     | `{state, utf8_sym, count}`       | `{symbols, probabilities}`     |
//! | Advance | `POST /v1/next_state` | `{state, context}`               | `{next_state}`                 |
//!
//! Errors come back as `{code, message}` with `code` one of `invalid_state`,
//! `invalid_argument` or `internal`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statelm::{ClientConfig, ScoringClient, StateHandle, rank};
//!
//! let client = ScoringClient::connect(&ClientConfig::default().with_server("localhost:50051"))?;
//!
//! let dist = client.score(StateHandle::UNKNOWN, "Hello wo").await?;
//! for candidate in rank(&dist).iter().take(3) {
//!     println!("{} {:.3}", candidate.symbol, candidate.probability);
//! }
//!
//! let report = client.observe("ab").await?;
//! println!("root after walk: {:?}", report.root);
//!
//! client.close().await;
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: State handles, symbols, messages and distributions
//! - [`client`]: Connection lifecycle, protocol calls, walk and tasks
//! - [`ranking`]: Candidate ranking
//! - [`server`]: Reference scoring server (Axum-based)
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod ranking;
pub mod server;

// Re-exports for convenience
pub use client::{BitsPerChar, Connection, HttpChannel, ScoringClient, ScoringService, WalkReport};
pub use config::{ClientConfig, Config};
pub use error::{Result, StateLmError};
pub use protocol::{ScoreDistribution, StateHandle, Symbol, PROTOCOL_VERSION};
pub use ranking::{rank, top_k, RankedCandidate};
pub use server::{AppState, LocalChannel, PrefixModel, ServerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
