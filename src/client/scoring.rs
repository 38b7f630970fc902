//! Score, update and advance operations.

use super::channel::ScoringService;
use super::connection::Connection;
use super::http::HttpChannel;
use crate::config::ClientConfig;
use crate::error::{Result, StateLmError};
use crate::protocol::{
    single_char, ContextRequest, ScoreDistribution, StateHandle, Symbol, UpdateRequest,
};

/// Protocol client over a [`Connection`].
///
/// Validates arguments before sending and every response before returning it.
pub struct ScoringClient<S = HttpChannel> {
    connection: Connection<S>,
}

impl<S> Clone for ScoringClient<S> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
        }
    }
}

impl ScoringClient<HttpChannel> {
    /// Open an HTTP connection to the configured server.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let channel = HttpChannel::new(config)?;
        tracing::info!("Connecting to {}", channel.base_url());
        Ok(Self::new(Connection::new(
            channel,
            config.timeout(),
            config.shutdown_grace(),
        )))
    }
}

impl<S: ScoringService> ScoringClient<S> {
    /// Create a client over an existing connection.
    pub fn new(connection: Connection<S>) -> Self {
        Self { connection }
    }

    /// Underlying connection.
    pub fn connection(&self) -> &Connection<S> {
        &self.connection
    }

    /// Close the connection, draining in-flight calls.
    pub async fn close(&self) -> bool {
        self.connection.close().await
    }

    /// Distribution over next symbols after `context` from `state`.
    ///
    /// Read-only. With [`StateHandle::UNKNOWN`] the context is interpreted from
    /// the model's start and no prior advance is needed.
    pub async fn score(&self, state: StateHandle, context: &str) -> Result<ScoreDistribution> {
        tracing::debug!(%state, context, "GetScores");
        let request = ContextRequest {
            state,
            context: context.to_string(),
        };
        let scores = self.connection.call(|s| s.get_scores(request)).await?;
        ScoreDistribution::from_scores(scores)
    }

    /// Add `count` observations of `codepoint` at `state`.
    ///
    /// Not idempotent: every successful call increments server counts once.
    /// Returns the distribution at `state` after the update.
    pub async fn update(
        &self,
        state: StateHandle,
        codepoint: i32,
        count: i32,
    ) -> Result<ScoreDistribution> {
        let symbol = Symbol::from_codepoint(codepoint)?;
        self.update_symbol(state, symbol, count).await
    }

    /// [`update`](Self::update) with a decoded symbol.
    pub async fn update_symbol(
        &self,
        state: StateHandle,
        symbol: Symbol,
        count: i32,
    ) -> Result<ScoreDistribution> {
        if count < 1 {
            return Err(StateLmError::InvalidArgument(format!(
                "count must be at least 1, got {count}"
            )));
        }
        if !symbol.is_encodable() {
            return Err(StateLmError::InvalidArgument(format!(
                "{symbol:?} would be sent as end-of-string"
            )));
        }
        tracing::debug!(%state, ?symbol, count, "UpdateScores");
        let request = UpdateRequest {
            state,
            utf8_sym: symbol.codepoint(),
            count,
        };
        let scores = self.connection.call(|s| s.update_scores(request)).await?;
        ScoreDistribution::from_scores(scores)
    }

    /// State reached after consuming exactly one character from `state`.
    pub async fn advance(&self, state: StateHandle, increment: &str) -> Result<StateHandle> {
        single_char(increment)?;
        self.advance_context(state, increment).await
    }

    /// State reached after consuming an arbitrary context from `state`.
    pub async fn advance_context(&self, state: StateHandle, context: &str) -> Result<StateHandle> {
        tracing::debug!(%state, context, "GetNextState");
        let request = ContextRequest {
            state,
            context: context.to_string(),
        };
        let next = self.connection.call(|s| s.get_next_state(request)).await?;
        if next.next_state.is_unknown() {
            return Err(StateLmError::ProtocolViolation(format!(
                "server returned sentinel {} as next state",
                next.next_state.to_wire()
            )));
        }
        Ok(next.next_state)
    }
}
