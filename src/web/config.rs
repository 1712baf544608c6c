//! Metrics server configuration.

use crate::error::{ExporterError, Result};
use crate::web::exposition::NoDataValue;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Configuration for the metrics server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Time allowed for a client to send its request head, and for the
    /// response to be written
    pub io_timeout: Duration,
    /// Value rendered for metrics that have no data
    pub no_data: NoDataValue,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            io_timeout: Duration::from_millis(crate::DEFAULT_READ_TIMEOUT_MS),
            no_data: NoDataValue::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the host for the server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the per-connection I/O timeout.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Set the value rendered when there is no data.
    pub fn with_no_data(mut self, no_data: NoDataValue) -> Self {
        self.no_data = no_data;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }

    /// Validate the configuration and resolve the bind address.
    ///
    /// IP literals (including IPv6 such as `::`) are used as-is; anything
    /// else is resolved as a host name and the first address wins.
    pub async fn socket_addr(&self) -> Result<SocketAddr> {
        if self.io_timeout.is_zero() {
            return Err(ExporterError::config_error(
                "Read timeout must be greater than zero",
            ));
        }

        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                ExporterError::config_error(format!(
                    "Invalid bind address {}: {}",
                    self.bind_address(),
                    e
                ))
            })?
            .next()
            .ok_or_else(|| {
                ExporterError::config_error(format!(
                    "Bind address {} resolved to nothing",
                    self.bind_address()
                ))
            })
    }
}
