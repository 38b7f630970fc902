//! Request/response channel abstraction.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::protocol::{ContextRequest, LmScores, NextState, UpdateRequest};

/// Boxed future returned by channel calls.
pub type CallFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A channel to a scoring server.
///
/// Implementations perform exactly one request/response exchange per call and
/// report raw responses; validation happens in [`ScoringClient`](super::ScoringClient).
pub trait ScoringService: Send + Sync {
    /// `GetScores`: distribution after `context` from `state`.
    fn get_scores(&self, request: ContextRequest) -> CallFuture<'_, LmScores>;

    /// `UpdateScores`: add counts and return the post-update distribution.
    fn update_scores(&self, request: UpdateRequest) -> CallFuture<'_, LmScores>;

    /// `GetNextState`: state reached after consuming `context`.
    fn get_next_state(&self, request: ContextRequest) -> CallFuture<'_, NextState>;

    /// Channel name for logging.
    fn name(&self) -> &'static str;
}
