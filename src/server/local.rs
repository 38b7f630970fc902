//! In-process channel to the reference model.

use std::sync::Arc;

use super::state::AppState;
use crate::client::{CallFuture, ScoringService};
use crate::protocol::{ContextRequest, LmScores, NextState, UpdateRequest};

/// [`ScoringService`] that calls the model directly, skipping HTTP.
#[derive(Clone)]
pub struct LocalChannel {
    state: Arc<AppState>,
}

impl LocalChannel {
    /// Wrap shared server state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Shared server state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl ScoringService for LocalChannel {
    fn get_scores(&self, request: ContextRequest) -> CallFuture<'_, LmScores> {
        Box::pin(async move {
            self.state
                .model
                .read()
                .await
                .get_scores(request.state, &request.context)
        })
    }

    fn update_scores(&self, request: UpdateRequest) -> CallFuture<'_, LmScores> {
        Box::pin(async move {
            self.state
                .model
                .write()
                .await
                .update(request.state, request.utf8_sym, request.count)
        })
    }

    fn get_next_state(&self, request: ContextRequest) -> CallFuture<'_, NextState> {
        Box::pin(async move {
            let next_state = self
                .state
                .model
                .write()
                .await
                .next_state(request.state, &request.context)?;
            Ok(NextState { next_state })
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
