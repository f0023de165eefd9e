//! Configuration file parsing for the server.
//!
//! Loads the listen addresses, logging filter, transport limits and the
//! list of services to leave unmounted from a TOML file.

use cosmos_proto::Registry;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A listen address does not parse
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidAddress {
        /// Offending field
        field: &'static str,
        /// Value as written in the file
        value: String,
        /// Parser message
        reason: String,
    },

    /// A disabled service is not one the server knows about
    #[error("Unknown service in disabled_services: {0}")]
    UnknownService(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC listen address (e.g., "127.0.0.1:9090")
    #[serde(default = "default_grpc_address")]
    pub grpc_address: String,

    /// Optional HTTP catalog listen address (e.g., "127.0.0.1:1317")
    #[serde(default)]
    pub http_address: Option<String>,

    /// Fully-qualified names of services that should not be mounted
    #[serde(default)]
    pub disabled_services: Vec<String>,

    /// Default tracing filter; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Maximum concurrent requests per connection
    #[serde(default)]
    pub concurrency_limit_per_connection: Option<usize>,
}

fn default_grpc_address() -> String {
    "127.0.0.1:9090".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_address: default_grpc_address(),
            http_address: None,
            disabled_services: Vec::new(),
            log_filter: default_log_filter(),
            request_timeout_secs: None,
            concurrency_limit_per_connection: None,
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check addresses and service names
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grpc_addr()?;
        self.http_addr()?;

        let registry = Registry::global();
        if let Some(name) = self
            .disabled_services
            .iter()
            .find(|name| registry.service(name).is_none())
        {
            return Err(ConfigError::UnknownService(name.clone()));
        }

        Ok(())
    }

    /// Parsed gRPC listen address
    pub fn grpc_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("grpc_address", &self.grpc_address)
    }

    /// Parsed HTTP listen address, if the catalog is enabled
    pub fn http_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        self.http_address
            .as_deref()
            .map(|addr| parse_addr("http_address", addr))
            .transpose()
    }

    /// Per-request timeout, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Whether `service` is listed in `disabled_services`
    pub fn is_disabled(&self, service: &str) -> bool {
        self.disabled_services.iter().any(|name| name == service)
    }
}

fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::InvalidAddress {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
