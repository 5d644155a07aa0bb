//! Server configuration from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

pub const HOST_VAR: &str = "SHIFT_SCHEDULER_HOST";
pub const PORT_VAR: &str = "SHIFT_SCHEDULER_PORT";

const DEFAULT_PORT: u16 = 7860;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid IP address: {value}")]
    InvalidHost { var: &'static str, value: String },
    #[error("{var} is not a valid port: {value}")]
    InvalidPort { var: &'static str, value: String },
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Reads [`HOST_VAR`] and [`PORT_VAR`], falling back to `0.0.0.0:7860`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ServerConfig::from_env`] with an arbitrary variable source.
    ///
    /// ```
    /// use shift_scheduler::config::ServerConfig;
    ///
    /// let config = ServerConfig::from_lookup(|key| match key {
    ///     "SHIFT_SCHEDULER_PORT" => Some("8080".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.addr().to_string(), "0.0.0.0:8080");
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = non_blank(lookup(HOST_VAR)) {
            config.host = value.parse().map_err(|_| ConfigError::InvalidHost {
                var: HOST_VAR,
                value: value.clone(),
            })?;
        }
        if let Some(value) = non_blank(lookup(PORT_VAR)) {
            config.port = value.parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_VAR,
                value: value.clone(),
            })?;
        }
        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
