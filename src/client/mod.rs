//! Protocol client.
//!
//! # Layers
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  tasks: k_best, random_generate, bpc      │
//! │  walk:  observe, observe_many             │
//! ├──────────────────────────────────────────┤
//! │  ScoringClient: score / update / advance  │  validation, response checks
//! ├──────────────────────────────────────────┤
//! │  Connection: permits, timeout, close      │  lifecycle
//! ├──────────────────────────────────────────┤
//! │  ScoringService (HttpChannel, ...)        │  one exchange per call
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use statelm::client::ScoringClient;
//! use statelm::config::ClientConfig;
//! use statelm::protocol::StateHandle;
//!
//! let client = ScoringClient::connect(&ClientConfig::default())?;
//! let dist = client.score(StateHandle::UNKNOWN, "Hello wo").await?;
//! let report = client.observe("ab").await?;
//! client.close().await;
//! ```

mod channel;
mod connection;
mod http;
mod scoring;
mod tasks;
mod walk;

pub use channel::{CallFuture, ScoringService};
pub use connection::Connection;
pub use http::HttpChannel;
pub use scoring::ScoringClient;
pub use tasks::{format_k_best, BitsPerChar, MAX_RANDGEN_LEN};
pub use walk::WalkReport;
