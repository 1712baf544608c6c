//! I2C bus access for the SEN5x on a Raspberry Pi.
//!
//! This module provides the hardware transport for the sensor driver.
//! It's feature-gated to allow compilation on non-Raspberry Pi systems.

use crate::error::{ExporterError, Result};
use crate::metrics::sen5x::{I2cTransport, Sen5xSensor};

#[cfg(feature = "hardware")]
mod raspberry_pi {
    use super::*;
    use crate::metrics::sen5x::SEN5X_ADDRESS;
    use rppal::i2c::I2c;

    /// SEN5x transport using rppal's I2C bus driver.
    pub struct RppalTransport {
        i2c: I2c,
    }

    impl RppalTransport {
        /// Open `/dev/i2c-<bus>` and address the SEN5x.
        pub fn open(bus: u8) -> Result<Self> {
            let mut i2c = I2c::with_bus(bus).map_err(|e| {
                ExporterError::setup_error(format!("Failed to open I2C bus {}: {}", bus, e))
            })?;

            i2c.set_slave_address(SEN5X_ADDRESS).map_err(|e| {
                ExporterError::setup_error(format!(
                    "Failed to address SEN5x at {:#04x}: {}",
                    SEN5X_ADDRESS, e
                ))
            })?;

            // The bus clock is fixed by the device tree; log it to spot slow buses.
            match i2c.clock_speed() {
                Ok(hz) => tracing::info!("Opened I2C bus {} at {} Hz", bus, hz),
                Err(e) => tracing::debug!("Could not read I2C clock speed: {}", e),
            }

            Ok(Self { i2c })
        }
    }

    impl I2cTransport for RppalTransport {
        fn write(&mut self, bytes: &[u8]) -> Result<()> {
            let written = self
                .i2c
                .write(bytes)
                .map_err(|e| ExporterError::acquisition_error(format!("I2C write failed: {}", e)))?;

            if written != bytes.len() {
                return Err(ExporterError::acquisition_error(format!(
                    "Short I2C write: {} of {} bytes",
                    written,
                    bytes.len()
                )));
            }
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            let read = self
                .i2c
                .read(buf)
                .map_err(|e| ExporterError::acquisition_error(format!("I2C read failed: {}", e)))?;

            if read != buf.len() {
                return Err(ExporterError::acquisition_error(format!(
                    "Short I2C read: {} of {} bytes",
                    read,
                    buf.len()
                )));
            }
            Ok(())
        }
    }

    pub fn open_transport(bus: u8) -> Result<RppalTransport> {
        RppalTransport::open(bus)
    }
}

#[cfg(not(feature = "hardware"))]
mod unavailable {
    use super::*;

    /// Placeholder transport for builds without I2C support.
    pub struct UnavailableTransport;

    impl I2cTransport for UnavailableTransport {
        fn write(&mut self, _bytes: &[u8]) -> Result<()> {
            Err(ExporterError::acquisition_error(
                "I2C not available on this build",
            ))
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<()> {
            Err(ExporterError::acquisition_error(
                "I2C not available on this build",
            ))
        }
    }

    pub fn open_transport(bus: u8) -> Result<UnavailableTransport> {
        Err(ExporterError::setup_error(format!(
            "Cannot open I2C bus {}: built without the `hardware` feature (use --simulate)",
            bus
        )))
    }
}

// Re-export the appropriate transport
#[cfg(feature = "hardware")]
pub use raspberry_pi::RppalTransport as DefaultTransport;

#[cfg(not(feature = "hardware"))]
pub use unavailable::UnavailableTransport as DefaultTransport;

#[cfg(feature = "hardware")]
use raspberry_pi::open_transport;

#[cfg(not(feature = "hardware"))]
use unavailable::open_transport;

/// Open the SEN5x on the given I2C bus and start measuring.
pub fn open_hardware_sensor(bus: u8) -> Result<Sen5xSensor<DefaultTransport>> {
    let transport = open_transport(bus)?;
    Sen5xSensor::open(transport)
}
