//! Sensor acquisition and the shared latest-reading snapshot.
//!
//! This module provides the reading data type, the [`SensorSource`] seam with
//! its SEN5x and simulated implementations, the single-slot
//! [`SharedSnapshot`] and the [`Poller`] that connects them.

pub mod data;
pub mod i2c;
pub mod poller;
pub mod sen5x;
pub mod simulated;
pub mod snapshot;
pub mod traits;

// Re-export commonly used items
pub use data::Reading;
pub use poller::Poller;
pub use simulated::SimulatedSensor;
pub use snapshot::SharedSnapshot;
pub use traits::SensorSource;
