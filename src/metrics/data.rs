//! Data structures for sensor readings.

use serde::{Deserialize, Serialize};

/// One complete set of measurements taken in a single acquisition pass.
///
/// Readings are never updated in place. A newer pass produces a new value that
/// replaces the old one in the [`SharedSnapshot`](crate::SharedSnapshot).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Timestamp when this reading was taken (Unix timestamp in milliseconds)
    pub timestamp: u64,
    /// Mass concentration PM1.0 in µg/m³
    pub pm1_0: f32,
    /// Mass concentration PM2.5 in µg/m³
    pub pm2_5: f32,
    /// Mass concentration PM4.0 in µg/m³
    pub pm4_0: f32,
    /// Mass concentration PM10 in µg/m³
    pub pm10_0: f32,
    /// Ambient relative humidity in percent
    pub humidity: Option<f32>,
    /// Ambient temperature in degrees Celsius
    pub temperature: Option<f32>,
    /// VOC index
    pub voc: f32,
    /// NOx index, unavailable for the first seconds after power-up
    pub nox: Option<f32>,
}

impl Reading {
    /// Create a reading stamped with the current time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pm1_0: f32,
        pm2_5: f32,
        pm4_0: f32,
        pm10_0: f32,
        humidity: Option<f32>,
        temperature: Option<f32>,
        voc: f32,
        nox: Option<f32>,
    ) -> Self {
        Self {
            timestamp: now_millis(),
            pm1_0,
            pm2_5,
            pm4_0,
            pm10_0,
            humidity,
            temperature,
            voc,
            nox,
        }
    }

    /// Replace the acquisition timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
