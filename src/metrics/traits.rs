//! Traits for sensor acquisition.

use crate::error::Result;
use crate::metrics::data::Reading;

/// Source of sensor readings.
///
/// Implementations wrap a physical (or simulated) sensor. Opening the device is
/// the implementation's constructor's job and is the only place a fatal error
/// may occur; `read_reading` failures are expected to be transient.
pub trait SensorSource {
    /// Acquire the next complete reading.
    fn read_reading(&mut self) -> impl std::future::Future<Output = Result<Reading>> + Send;
}
