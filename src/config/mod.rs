//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (applied by the binary on top of the above)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StateLmError};
use crate::protocol::DEFAULT_SERVER_ADDRESS;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Reference server configuration
    #[serde(default)]
    pub server: ServerSection,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            StateLmError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        toml::from_str(&content)
            .map_err(|e| StateLmError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load the default config file if it exists, otherwise defaults.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("STATELM_SERVER") {
            config.client.server_address = addr;
        }
        if let Ok(secs) = std::env::var("STATELM_TIMEOUT_SECS") {
            if let Some(secs) = parse_env("STATELM_TIMEOUT_SECS", &secs) {
                config.client.timeout_secs = secs;
            }
        }
        if let Ok(port) = std::env::var("STATELM_SERVER_PORT") {
            if let Some(port) = parse_env("STATELM_SERVER_PORT", &port) {
                config.server.port = port;
            }
        }

        config
    }

    /// Merge with another config (other takes precedence where it differs from defaults)
    pub fn merge(self, other: Self) -> Self {
        let client_defaults = ClientConfig::default();
        let server_defaults = ServerSection::default();

        Self {
            client: ClientConfig {
                server_address: if other.client.server_address != client_defaults.server_address {
                    other.client.server_address
                } else {
                    self.client.server_address
                },
                timeout_secs: if other.client.timeout_secs != client_defaults.timeout_secs {
                    other.client.timeout_secs
                } else {
                    self.client.timeout_secs
                },
                shutdown_grace_secs: if other.client.shutdown_grace_secs
                    != client_defaults.shutdown_grace_secs
                {
                    other.client.shutdown_grace_secs
                } else {
                    self.client.shutdown_grace_secs
                },
            },
            server: ServerSection {
                host: if other.server.host != server_defaults.host {
                    other.server.host
                } else {
                    self.server.host
                },
                port: if other.server.port != server_defaults.port {
                    other.server.port
                } else {
                    self.server.port
                },
                vocabulary: if other.server.vocabulary != server_defaults.vocabulary {
                    other.server.vocabulary
                } else {
                    self.server.vocabulary
                },
                max_body_size: if other.server.max_body_size != server_defaults.max_body_size {
                    other.server.max_body_size
                } else {
                    self.server.max_body_size
                },
            },
        }
    }
}

/// Parse an environment override, warning when it is dropped.
fn parse_env<T: FromStr>(name: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("ignoring {name}={value:?}: not a valid value");
            None
        },
    }
}

/// Default config file location (`<config_dir>/statelm/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("statelm").join("config.toml"))
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scoring server `host:port` (or full URL)
    pub server_address: String,

    /// Per-call timeout in seconds
    pub timeout_secs: f64,

    /// Grace period for in-flight calls when closing, in seconds
    pub shutdown_grace_secs: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            timeout_secs: 10.0,
            shutdown_grace_secs: 5.0,
        }
    }
}

impl ClientConfig {
    /// Set server address
    pub fn with_server(mut self, addr: impl Into<String>) -> Self {
        self.server_address = addr.into();
        self
    }

    /// Set per-call timeout
    pub fn with_timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Check values that would otherwise fail at call time.
    pub fn validate(&self) -> Result<()> {
        if self.server_address.trim().is_empty() {
            return Err(StateLmError::Config("server address is empty".to_string()));
        }
        if !(self.timeout_secs.is_finite() && self.timeout_secs > 0.0) {
            return Err(StateLmError::Config(format!(
                "timeout must be positive, got {}",
                self.timeout_secs
            )));
        }
        if !(self.shutdown_grace_secs.is_finite() && self.shutdown_grace_secs >= 0.0) {
            return Err(StateLmError::Config(format!(
                "shutdown grace must be non-negative, got {}",
                self.shutdown_grace_secs
            )));
        }
        Ok(())
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    /// Drain period on close
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs_f64(self.shutdown_grace_secs)
    }

    /// Base URL derived from the server address.
    pub fn base_url(&self) -> String {
        let addr = self.server_address.trim().trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        }
    }
}

/// Reference server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Symbols known before any update
    pub vocabulary: String,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
            vocabulary: String::new(),
            max_body_size: 1024 * 1024, // 1 MB
        }
    }
}

impl ServerSection {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
