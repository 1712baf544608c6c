//! Error handling for the SEN5x exporter crate.

/// A specialized `Result` type for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// The main error type for exporter operations.
///
/// Only [`ExporterError::Setup`] and [`ExporterError::Config`] are fatal. Everything
/// else is contained in the task that produced it: acquisition failures are retried
/// by the poller and connection failures close that one connection.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transient sensor bus fault
    #[error("Sensor acquisition failed: {0}")]
    Acquisition(String),

    /// Client socket fault or malformed request
    #[error("Connection error: {0}")]
    Connection(String),

    /// Sensor could not be opened or the listener could not be bound
    #[error("Setup error: {0}")]
    Setup(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExporterError {
    /// Create a new acquisition error
    pub fn acquisition_error(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    /// Create a new connection error
    pub fn connection_error(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new setup error
    pub fn setup_error(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error should abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Setup(_) | Self::Config(_))
    }
}
