//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::error::StateLmError;
use crate::protocol::{
    ContextRequest, ErrorBody, ErrorCode, NextState, UpdateRequest, NEXT_STATE_PATH,
    PROTOCOL_VERSION, SCORES_PATH, UPDATE_PATH,
};

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let logging = state.config.logging;
    let max_body_size = state.config.max_body_size;

    let router = Router::new()
        .route("/health", get(health_check))
        .route(SCORES_PATH, post(get_scores))
        .route(UPDATE_PATH, post(update_scores))
        .route(NEXT_STATE_PATH, post(get_next_state))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state);

    if logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Protocol version
    pub protocol: &'static str,
    /// Seconds since the server started
    pub uptime_secs: u64,
    /// States issued so far
    pub states: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let states = state.model.read().await.num_states();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        protocol: PROTOCOL_VERSION,
        uptime_secs: state.uptime().as_secs(),
        states,
    })
}

/// Error wrapper rendering a [`StateLmError`] as a protocol error body.
pub struct ApiError(StateLmError);

impl From<StateLmError> for ApiError {
    fn from(e: StateLmError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self.0 {
            StateLmError::InvalidState { message, .. } => {
                (StatusCode::NOT_FOUND, ErrorCode::InvalidState, message)
            },
            StateLmError::InvalidArgument(message) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidArgument, message)
            },
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::Internal,
                other.to_string(),
            ),
        };
        tracing::debug!(%status, %message, "request rejected");
        (status, Json(ErrorBody { code, message })).into_response()
    }
}

async fn get_scores(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scores = state.model.read().await.get_scores(req.state, &req.context)?;
    Ok(Json(scores))
}

async fn update_scores(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let scores = state
        .model
        .write()
        .await
        .update(req.state, req.utf8_sym, req.count)?;
    Ok(Json(scores))
}

async fn get_next_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let next_state = state
        .model
        .write()
        .await
        .next_state(req.state, &req.context)?;
    Ok(Json(NextState { next_state }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::LmScores;
    use crate::server::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let config = ServerConfig::default().with_vocabulary("ab").without_logging();
        create_router(Arc::new(AppState::new(config)))
    }

    async fn post_json(router: Router, path: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::post(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_scores_endpoint() {
        let (status, body) = post_json(
            router(),
            SCORES_PATH,
            serde_json::json!({"state": -1, "context": "a"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let scores: LmScores = serde_json::from_slice(&body).unwrap();
        assert_eq!(scores.symbols.len(), 3);
        assert_eq!(scores.probabilities.len(), 3);
    }

    #[tokio::test]
    async fn test_update_endpoint() {
        let (status, body) = post_json(
            router(),
            UPDATE_PATH,
            serde_json::json!({"state": 0, "utf8_sym": 99, "count": 2}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let scores: LmScores = serde_json::from_slice(&body).unwrap();
        assert!(scores.symbols.contains(&"c".to_string()));
    }

    #[tokio::test]
    async fn test_next_state_endpoint() {
        let (status, body) = post_json(
            router(),
            NEXT_STATE_PATH,
            serde_json::json!({"state": 0, "context": "a"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let next: NextState = serde_json::from_slice(&body).unwrap();
        assert_eq!(next.next_state.to_wire(), 1);
    }

    #[tokio::test]
    async fn test_unknown_state_is_not_found() {
        let (status, body) = post_json(
            router(),
            SCORES_PATH,
            serde_json::json!({"state": 42, "context": ""}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[tokio::test]
    async fn test_bad_count_is_bad_request() {
        let (status, body) = post_json(
            router(),
            UPDATE_PATH,
            serde_json::json!({"state": 0, "utf8_sym": 97, "count": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }
}
