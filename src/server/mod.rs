//! Reference scoring server.
//!
//! Serves the three protocol calls over HTTP/JSON from an in-memory
//! [`PrefixModel`]:
//! - `POST /v1/scores` - distribution after a context
//! - `POST /v1/update` - add symbol counts at a state
//! - `POST /v1/next_state` - advance a state by a context
//! - `GET /health` - liveness
//!
//! # Example
//!
//! ```rust,ignore
//! use statelm::server::{self, ServerConfig};
//!
//! let config = ServerConfig::default().with_port(50051).with_vocabulary("abc");
//! server::run(config, tokio::signal::ctrl_c()).await?;
//! ```

mod config;
mod handlers;
mod local;
mod model;
mod state;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use config::ServerConfig;
pub use handlers::{create_router, health_check, ApiError, HealthResponse};
pub use local::LocalChannel;
pub use model::PrefixModel;
pub use state::AppState;

use crate::error::Result;

/// Serve `state` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("scoring server stopped");
    Ok(())
}

/// Bind `config.addr` and serve until `shutdown` resolves.
pub async fn run<F, T>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = T> + Send + 'static,
    T: Send,
{
    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        vocabulary = config.vocabulary.chars().count(),
        "starting scoring server"
    );
    let state = Arc::new(AppState::new(config));
    serve(listener, state, async move {
        shutdown.await;
    })
    .await
}
