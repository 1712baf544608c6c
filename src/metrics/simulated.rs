//! Synthetic sensor for running the exporter without hardware.

use crate::error::Result;
use crate::metrics::data::Reading;
use crate::metrics::traits::SensorSource;

/// Passes during which NOx is reported as unavailable, like a cold SEN55.
const NOX_WARMUP_PASSES: u64 = 3;

/// Deterministic slowly-drifting readings.
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    pass: u64,
}

impl SimulatedSensor {
    /// Create a simulator positioned at its first pass, with NOx still warming up.
    pub fn new() -> Self {
        Self::default()
    }

    fn sample(&self) -> Reading {
        let phase = self.pass as f32 / 12.0;
        let wave = phase.sin();

        let pm2_5 = round1(8.0 + 2.0 * wave);
        let nox = (self.pass >= NOX_WARMUP_PASSES).then(|| round1(15.0 + 3.0 * phase.cos()));

        Reading::new(
            round1(pm2_5 * 0.8),
            pm2_5,
            round1(pm2_5 * 1.1),
            round1(pm2_5 * 1.25),
            Some(round1(45.0 + 5.0 * wave)),
            Some(round1(22.0 + 1.5 * phase.cos())),
            round1(100.0 + 20.0 * wave),
            nox,
        )
    }
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

impl SensorSource for SimulatedSensor {
    async fn read_reading(&mut self) -> Result<Reading> {
        let reading = self.sample();
        self.pass += 1;
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nox_warms_up() {
        let mut sensor = SimulatedSensor::new();
        for _ in 0..NOX_WARMUP_PASSES {
            assert_eq!(sensor.read_reading().await.unwrap().nox, None);
        }
        assert!(sensor.read_reading().await.unwrap().nox.is_some());
    }

    #[tokio::test]
    async fn test_values_are_plausible() {
        let mut sensor = SimulatedSensor::new();
        for _ in 0..50 {
            let reading = sensor.read_reading().await.unwrap();
            assert!(reading.pm1_0 <= reading.pm2_5);
            assert!(reading.pm2_5 <= reading.pm10_0);
            let humidity = reading.humidity.unwrap();
            assert!((0.0..=100.0).contains(&humidity));
        }
    }
}
