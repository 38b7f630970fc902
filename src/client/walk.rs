//! Incremental walk: train the model on an observed string.
//!
//! # Sequence
//!
//! ```text
//! state = 0
//! for c in text:
//!     UpdateScores(state, c, 1)     count c as following `state`
//!     state = GetNextState(state, c)
//! UpdateScores(state, 0, 1)         end-of-string at the final state
//! GetScores(0, "")                  report the root distribution
//! ```
//!
//! Counts are attributed to the state *before* `c` is consumed, so the update
//! must precede the advance at every position. Each step needs the state the
//! previous step produced; nothing inside a walk runs concurrently. The first
//! failing call ends the walk and is never retried.

use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use super::channel::ScoringService;
use super::scoring::ScoringClient;
use crate::error::Result;
use crate::protocol::{check_text, ScoreDistribution, StateHandle, Symbol};

/// Outcome of a completed walk.
#[derive(Debug, Clone)]
pub struct WalkReport {
    /// State reached after the last character.
    pub final_state: StateHandle,
    /// Characters observed (excluding end-of-string).
    pub characters: usize,
    /// Update and advance calls issued (`2 * characters + 1`).
    pub calls: usize,
    /// Distribution at `final_state` after the end-of-string update.
    pub terminal: ScoreDistribution,
    /// Root distribution queried after the walk.
    pub root: ScoreDistribution,
}

impl<S: ScoringService> ScoringClient<S> {
    /// Feed `text` into the model one character at a time.
    pub async fn observe(&self, text: &str) -> Result<WalkReport> {
        let span = tracing::info_span!("walk", id = %Uuid::new_v4(), chars = text.chars().count());
        self.observe_inner(text).instrument(span).await
    }

    /// Run independent walks concurrently.
    ///
    /// Each walk is sequential on its own; results are in input order and a
    /// failure only ends the walk it happened in.
    pub async fn observe_many<T: AsRef<str>>(&self, texts: &[T]) -> Vec<Result<WalkReport>> {
        join_all(texts.iter().map(|t| self.observe(t.as_ref()))).await
    }

    async fn observe_inner(&self, text: &str) -> Result<WalkReport> {
        check_text(text)?;
        let mut state = StateHandle::INITIAL;
        let mut characters = 0;
        let mut calls = 0;

        for c in text.chars() {
            self.update_symbol(state, Symbol::Char(c), 1).await?;
            calls += 1;

            let mut buf = [0u8; 4];
            state = self.advance(state, c.encode_utf8(&mut buf)).await?;
            calls += 1;
            characters += 1;
        }

        let terminal = self.update_symbol(state, Symbol::EndOfString, 1).await?;
        calls += 1;

        let root = self.score(StateHandle::INITIAL, "").await?;
        tracing::info!(characters, calls, final_state = %state, "walk complete");

        Ok(WalkReport {
            final_state: state,
            characters,
            calls,
            terminal,
            root,
        })
    }
}
