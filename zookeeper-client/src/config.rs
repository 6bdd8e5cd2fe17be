//! Client configuration types and builders.

use std::time::Duration;

use crate::connection::ensemble;

/// Default ensemble connection string.
const DEFAULT_ENSEMBLE: &str = "127.0.0.1:2181";
/// Default requested session timeout.
const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(2);
/// Default TCP connect timeout per endpoint.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default retry bound; zero means a single attempt.
const DEFAULT_MAX_RETRIES: u32 = 0;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a [`ZkClient`](crate::ZkClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    ensemble: String,
    session_timeout: Duration,
    connect_timeout: Duration,
    max_retries: u32,
}

impl ClientConfig {
    /// Returns a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the comma-separated `host:port` ensemble string.
    pub fn ensemble(&self) -> &str {
        &self.ensemble
    }

    /// Returns the session timeout requested in the handshake.
    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Returns the TCP connect timeout applied per endpoint.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the retry bound: additional attempts after the first.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfigBuilder::new()
            .build()
            .expect("default configuration must be valid")
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    ensemble: Option<String>,
    session_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl ClientConfigBuilder {
    /// Creates a new client configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comma-separated `host:port` ensemble string.
    pub fn ensemble(mut self, ensemble: impl Into<String>) -> Self {
        self.ensemble = Some(ensemble.into());
        self
    }

    /// Sets the session timeout requested in the handshake.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Sets the TCP connect timeout applied per endpoint.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry bound: additional attempts after the first.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Builds the client configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let ensemble = self.ensemble.unwrap_or_else(|| DEFAULT_ENSEMBLE.to_string());

        let endpoints = ensemble::parse(&ensemble);
        if endpoints.is_empty() {
            return Err(ConfigError::new("ensemble must contain at least one endpoint"));
        }
        for endpoint in &endpoints {
            if !endpoint.contains(':') {
                return Err(ConfigError::new(format!(
                    "ensemble endpoint '{}' is not of the form host:port",
                    endpoint
                )));
            }
        }

        let session_timeout = self.session_timeout.unwrap_or(DEFAULT_SESSION_TIMEOUT);
        if session_timeout.is_zero() {
            return Err(ConfigError::new("session timeout must be positive"));
        }

        Ok(ClientConfig {
            ensemble,
            session_timeout,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}
