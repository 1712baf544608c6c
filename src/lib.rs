//! # SEN5x Exporter - Air Quality Metrics for Prometheus
//!
//! Samples a Sensirion SEN5x environmental sensor (particulate matter, humidity,
//! temperature, VOC and NOx) on a fixed interval and serves the latest reading
//! in the Prometheus text exposition format over plain HTTP.
//!
//! ## Features
//!
//! - **Background polling**: transient sensor faults are logged and retried, never fatal
//! - **Consistent scrapes**: readers always see one complete reading, never a torn one
//! - **Tiny HTTP surface**: one fixed response per connection, bounded reads
//! - **Cross-compilation**: I2C support is feature-gated (`hardware`)
//! - **Library + Binary**: Use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sen5x_exporter::{serve, Poller, ServerConfig, SharedSnapshot, SimulatedSensor};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let snapshot = SharedSnapshot::new();
//!     let poller = Poller::new(SimulatedSensor::new(), Duration::from_secs(5))?;
//!     tokio::spawn(poller.run(snapshot.clone()));
//!
//!     // Serve metrics on port 9100
//!     serve(ServerConfig::new("0.0.0.0", 9100), snapshot).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use error::{ExporterError, Result};
pub use metrics::{
    data::Reading,
    i2c::open_hardware_sensor,
    poller::Poller,
    sen5x::{I2cTransport, Sen5x, Sen5xSensor},
    simulated::SimulatedSensor,
    snapshot::SharedSnapshot,
    traits::SensorSource,
};

pub use web::{serve, MetricsServer, NoDataValue, ServerConfig};

/// The default sampling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;

/// The default metrics server port
pub const DEFAULT_PORT: u16 = 80;

/// The default time allowed for a client to send its request, in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

/// The default I2C bus the sensor is attached to
pub const DEFAULT_I2C_BUS: u8 = 1;
