//! Sensirion SEN5x driver.
//!
//! The SEN5x speaks a command/response protocol over I2C: the host writes a
//! 16-bit big-endian command code, waits for the command's execution time and
//! then reads back a sequence of 16-bit words, each followed by a CRC-8 byte.
//!
//! The driver is generic over [`I2cTransport`] so the protocol can be exercised
//! without hardware; the rppal-backed transport lives in
//! [`crate::metrics::i2c`].

use crate::error::{ExporterError, Result};
use crate::metrics::data::Reading;
use crate::metrics::traits::SensorSource;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Fixed I2C address of every SEN5x variant.
pub const SEN5X_ADDRESS: u16 = 0x69;

const CRC8_POLYNOMIAL: u8 = 0x31;
const CRC8_INIT: u8 = 0xFF;

/// Raw value reported for an unavailable unsigned measurement.
const UNSIGNED_NOT_AVAILABLE: u16 = 0xFFFF;
/// Raw value reported for an unavailable signed measurement.
const SIGNED_NOT_AVAILABLE: i16 = 0x7FFF;

/// Commands used by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartMeasurement,
    StopMeasurement,
    ReadDataReady,
    ReadMeasuredValues,
    DeviceReset,
}

impl Command {
    /// 16-bit command code.
    pub fn code(self) -> u16 {
        match self {
            Command::StartMeasurement => 0x0021,
            Command::StopMeasurement => 0x0104,
            Command::ReadDataReady => 0x0202,
            Command::ReadMeasuredValues => 0x03C4,
            Command::DeviceReset => 0xD304,
        }
    }

    /// Minimum wait between sending the command and reading the response.
    pub fn execution_time(self) -> Duration {
        match self {
            Command::StartMeasurement => Duration::from_millis(50),
            Command::StopMeasurement | Command::DeviceReset => Duration::from_millis(200),
            Command::ReadDataReady | Command::ReadMeasuredValues => Duration::from_millis(20),
        }
    }

    /// Number of data words in the response.
    pub fn response_words(self) -> usize {
        match self {
            Command::ReadDataReady => 1,
            Command::ReadMeasuredValues => 8,
            _ => 0,
        }
    }
}

/// CRC-8 as used by Sensirion sensors (polynomial 0x31, init 0xFF).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLYNOMIAL
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Split a response buffer into words, verifying each word's CRC.
pub fn decode_words(buf: &[u8]) -> Result<Vec<u16>> {
    if buf.len() % 3 != 0 {
        return Err(ExporterError::acquisition_error(format!(
            "response length {} is not a multiple of 3",
            buf.len()
        )));
    }

    buf.chunks_exact(3)
        .enumerate()
        .map(|(index, chunk)| {
            let expected = crc8(&chunk[..2]);
            if expected != chunk[2] {
                return Err(ExporterError::acquisition_error(format!(
                    "CRC mismatch in word {}: expected {:#04x}, got {:#04x}",
                    index, expected, chunk[2]
                )));
            }
            Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
        })
        .collect()
}

fn scale_unsigned(raw: u16, factor: f32) -> Option<f32> {
    (raw != UNSIGNED_NOT_AVAILABLE).then(|| raw as f32 / factor)
}

fn scale_signed(raw: u16, factor: f32) -> Option<f32> {
    let value = raw as i16;
    (value != SIGNED_NOT_AVAILABLE).then(|| value as f32 / factor)
}

/// Convert the eight words of a "read measured values" response into a reading.
///
/// Unavailable humidity, temperature and NOx become `None`; unavailable
/// particulate or VOC values become `NaN`.
pub fn decode_measured_values(words: &[u16]) -> Result<Reading> {
    let words: &[u16; 8] = words.try_into().map_err(|_| {
        ExporterError::acquisition_error(format!(
            "expected 8 measurement words, got {}",
            words.len()
        ))
    })?;

    Ok(Reading::new(
        scale_unsigned(words[0], 10.0).unwrap_or(f32::NAN),
        scale_unsigned(words[1], 10.0).unwrap_or(f32::NAN),
        scale_unsigned(words[2], 10.0).unwrap_or(f32::NAN),
        scale_unsigned(words[3], 10.0).unwrap_or(f32::NAN),
        scale_signed(words[4], 100.0),
        scale_signed(words[5], 200.0),
        scale_signed(words[6], 10.0).unwrap_or(f32::NAN),
        scale_signed(words[7], 10.0),
    ))
}

/// Raw byte access to the sensor's bus.
pub trait I2cTransport {
    /// Write all of `bytes` to the sensor.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Fill `buf` from the sensor.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Block for a command's execution time.
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocking SEN5x driver.
///
/// Measurement mode is stopped when the driver is dropped.
pub struct Sen5x<T: I2cTransport> {
    transport: T,
    measuring: bool,
}

impl<T: I2cTransport> Sen5x<T> {
    /// Wrap a transport. No bus traffic happens until a command is issued.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            measuring: false,
        }
    }

    fn execute(&mut self, command: Command) -> Result<Vec<u16>> {
        self.transport.write(&command.code().to_be_bytes())?;
        self.transport.delay(command.execution_time());

        let words = command.response_words();
        if words == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; words * 3];
        self.transport.read(&mut buf)?;
        decode_words(&buf)
    }

    /// Enter continuous measurement mode.
    pub fn start_measurement(&mut self) -> Result<()> {
        self.execute(Command::StartMeasurement)?;
        self.measuring = true;
        Ok(())
    }

    /// Leave measurement mode.
    pub fn stop_measurement(&mut self) -> Result<()> {
        self.execute(Command::StopMeasurement)?;
        self.measuring = false;
        Ok(())
    }

    /// Reset the sensor to its power-up state.
    pub fn device_reset(&mut self) -> Result<()> {
        self.execute(Command::DeviceReset)?;
        self.measuring = false;
        Ok(())
    }

    /// Whether a new measurement is available.
    pub fn data_ready(&mut self) -> Result<bool> {
        let words = self.execute(Command::ReadDataReady)?;
        Ok(words.first().is_some_and(|word| word & 0x00FF != 0))
    }

    /// Read the latest measurement without checking the data-ready flag.
    pub fn read_measured_values(&mut self) -> Result<Reading> {
        let words = self.execute(Command::ReadMeasuredValues)?;
        decode_measured_values(&words)
    }

    /// Read a fresh measurement, failing if none is ready yet.
    pub fn read_reading(&mut self) -> Result<Reading> {
        if !self.data_ready()? {
            return Err(ExporterError::acquisition_error("measurement not ready"));
        }
        self.read_measured_values()
    }

    pub fn is_measuring(&self) -> bool {
        self.measuring
    }
}

impl<T: I2cTransport> Drop for Sen5x<T> {
    fn drop(&mut self) {
        if self.measuring {
            if let Err(e) = self.stop_measurement() {
                tracing::warn!("Failed to stop SEN5x measurement: {}", e);
            }
        }
    }
}

/// [`SensorSource`] backed by a SEN5x on a blocking transport.
///
/// Bus transactions run on tokio's blocking pool so the runtime's worker
/// threads never wait on the sensor. Dropping the sensor inside a runtime
/// stops measurement on the blocking pool too.
pub struct Sen5xSensor<T: I2cTransport + Send + 'static> {
    driver: Arc<Mutex<Sen5x<T>>>,
}

impl<T: I2cTransport + Send + 'static> Sen5xSensor<T> {
    /// Start measurement on the sensor behind `transport`.
    ///
    /// Any failure here means the sensor cannot be used at all and is reported
    /// as a setup error.
    pub fn open(transport: T) -> Result<Self> {
        let mut driver = Sen5x::new(transport);
        driver.start_measurement().map_err(|e| {
            ExporterError::setup_error(format!("Failed to start SEN5x measurement: {}", e))
        })?;
        tracing::info!("SEN5x measurement started");

        Ok(Self {
            driver: Arc::new(Mutex::new(driver)),
        })
    }
}

impl<T: I2cTransport + Send + 'static> Drop for Sen5xSensor<T> {
    fn drop(&mut self) {
        // The last reference to the driver sends the stop command and waits
        // out its execution time.
        let driver = Arc::clone(&self.driver);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn_blocking(move || drop(driver));
        }
    }
}

impl<T: I2cTransport + Send + 'static> SensorSource for Sen5xSensor<T> {
    async fn read_reading(&mut self) -> Result<Reading> {
        let driver = Arc::clone(&self.driver);
        tokio::task::spawn_blocking(move || {
            driver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .read_reading()
        })
        .await
        .map_err(|e| ExporterError::acquisition_error(format!("Sensor task failed: {}", e)))?
    }
}
