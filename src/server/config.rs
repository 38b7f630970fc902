//! Server configuration.

use std::net::SocketAddr;

use crate::config::ServerSection;
use crate::error::{Result, StateLmError};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Symbols known before any update
    pub vocabulary: String,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Enable request logging
    pub logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            vocabulary: String::new(),
            max_body_size: 1024 * 1024, // 1MB
            logging: true,
        }
    }
}

impl ServerConfig {
    /// Build from the `[server]` config section.
    pub fn from_section(section: &ServerSection) -> Result<Self> {
        let addr = section.listen_addr().parse().map_err(|e| {
            StateLmError::Config(format!("invalid listen address {}: {e}", section.listen_addr()))
        })?;
        Ok(Self {
            addr,
            vocabulary: section.vocabulary.clone(),
            max_body_size: section.max_body_size,
            ..Self::default()
        })
    }

    /// Create with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }

    /// Set address directly
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set initial vocabulary
    pub fn with_vocabulary(mut self, vocabulary: &str) -> Self {
        self.vocabulary = vocabulary.to_string();
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }
}
