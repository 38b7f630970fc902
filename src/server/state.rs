//! Server state shared across handlers.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use super::config::ServerConfig;
use super::model::PrefixModel;

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Model; updates take the write lock so each is applied exactly once
    pub model: RwLock<PrefixModel>,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServerConfig) -> Self {
        let model = PrefixModel::new(&config.vocabulary);
        Self {
            config,
            model: RwLock::new(model),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
