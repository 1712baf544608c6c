//! Periodic sensor acquisition.

use crate::error::{ExporterError, Result};
use crate::metrics::snapshot::SharedSnapshot;
use crate::metrics::traits::SensorSource;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Samples a [`SensorSource`] on a fixed interval and publishes every
/// successful reading into a [`SharedSnapshot`].
///
/// Failures inside the loop never stop it: the previous reading stays
/// authoritative and the next attempt happens one interval later.
pub struct Poller<S> {
    source: S,
    interval: Duration,
    consecutive_failures: u64,
}

impl<S: SensorSource> Poller<S> {
    /// Create a poller. The interval must be non-zero.
    pub fn new(source: S, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ExporterError::config_error(
                "Sampling interval must be greater than zero",
            ));
        }

        Ok(Self {
            source,
            interval,
            consecutive_failures: 0,
        })
    }

    /// Delay between acquisition passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Length of the current streak of failed acquisitions.
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Run one acquisition pass, publishing on success.
    pub async fn poll_once(&mut self, sink: &SharedSnapshot) -> Result<()> {
        match self.source.read_reading().await {
            Ok(reading) => {
                sink.publish(reading);
                if self.consecutive_failures > 0 {
                    info!(
                        "Sensor recovered after {} failed acquisition(s)",
                        self.consecutive_failures
                    );
                    self.consecutive_failures = 0;
                }
                debug!(?reading, "Published sensor reading");
                Ok(())
            }
            Err(err) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures == 1 {
                    warn!("Failed to acquire sensor reading: {}", err);
                } else {
                    debug!(
                        failures = self.consecutive_failures,
                        "Sensor acquisition still failing: {}", err
                    );
                }
                Err(err)
            }
        }
    }

    /// Poll forever.
    ///
    /// The first pass runs immediately; later passes follow at the configured
    /// interval. A pass that overruns delays the next one instead of bursting.
    pub async fn run(mut self, sink: SharedSnapshot) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Polling sensor every {:?}", self.interval);
        loop {
            ticker.tick().await;
            // Errors are already reported by poll_once.
            let _ = self.poll_once(&sink).await;
        }
    }
}
