//! HTTP/JSON channel to a scoring server.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::channel::{CallFuture, ScoringService};
use crate::config::ClientConfig;
use crate::error::{Result, StateLmError};
use crate::protocol::{
    ContextRequest, ErrorBody, ErrorCode, LmScores, NextState, StateHandle, UpdateRequest,
    NEXT_STATE_PATH, SCORES_PATH, UPDATE_PATH,
};

/// Scoring server reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpChannel {
    /// Build a channel from client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StateLmError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            timeout,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, state: StateHandle, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StateLmError::Timeout(self.timeout)
                } else {
                    StateLmError::Transport(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(map_error_status(status, state, &text))
    }
}

/// Translate a non-2xx response into the error taxonomy.
fn map_error_status(status: StatusCode, state: StateHandle, text: &str) -> StateLmError {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            code: ErrorCode::InvalidState,
            message,
        }) => StateLmError::InvalidState {
            state: state.to_wire(),
            message,
        },
        Ok(ErrorBody {
            code: ErrorCode::InvalidArgument,
            message,
        }) => StateLmError::InvalidArgument(message),
        Ok(ErrorBody { message, .. }) => StateLmError::Server(format!("{status}: {message}")),
        Err(_) if status == StatusCode::NOT_FOUND => {
            StateLmError::Server(format!("{status}: endpoint not found"))
        },
        Err(_) => StateLmError::Server(format!("{status}: {text}")),
    }
}

impl ScoringService for HttpChannel {
    fn get_scores(&self, request: ContextRequest) -> CallFuture<'_, LmScores> {
        Box::pin(async move { self.post(SCORES_PATH, request.state, &request).await })
    }

    fn update_scores(&self, request: UpdateRequest) -> CallFuture<'_, LmScores> {
        Box::pin(async move { self.post(UPDATE_PATH, request.state, &request).await })
    }

    fn get_next_state(&self, request: ContextRequest) -> CallFuture<'_, NextState> {
        Box::pin(async move { self.post(NEXT_STATE_PATH, request.state, &request).await })
    }

    fn name(&self) -> &'static str {
        "HTTP"
    }
}
