//! Single-slot holder for the latest reading.

use crate::metrics::data::Reading;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct Slot {
    version: u64,
    reading: Option<Reading>,
}

/// The most recently published [`Reading`], shared between the poller and any
/// number of request handlers.
///
/// Publishing replaces the whole reading and bumps the version under one write
/// lock, so readers see either the previous reading or the new one, never a mix.
/// The lock only guards a copy; it is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Slot>>,
}

impl SharedSnapshot {
    /// Create an empty snapshot (version 0, no reading).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current reading.
    pub fn publish(&self, reading: Reading) {
        // The slot is replaced whole, so a poisoned lock never holds a torn value.
        let mut slot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        slot.reading = Some(reading);
        slot.version += 1;
    }

    /// The current reading, or `None` if nothing has been published yet.
    pub fn read(&self) -> Option<Reading> {
        self.read_versioned().1
    }

    /// The current version together with its reading.
    pub fn read_versioned(&self) -> (u64, Option<Reading>) {
        let slot = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (slot.version, slot.reading)
    }

    /// Number of publishes so far.
    pub fn version(&self) -> u64 {
        self.read_versioned().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn reading(seed: f32) -> Reading {
        Reading::new(
            seed,
            seed,
            seed,
            seed,
            Some(seed),
            Some(seed),
            seed,
            Some(seed),
        )
        .with_timestamp(seed as u64)
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = SharedSnapshot::new();
        assert_eq!(snapshot.read(), None);
        assert_eq!(snapshot.version(), 0);
    }

    #[test]
    fn test_read_after_publish() {
        let snapshot = SharedSnapshot::new();
        let first = reading(1.0);
        snapshot.publish(first);
        assert_eq!(snapshot.read(), Some(first));

        let second = reading(2.0);
        snapshot.clone().publish(second);
        assert_eq!(snapshot.read_versioned(), (2, Some(second)));
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_reading() {
        let snapshot = SharedSnapshot::new();
        snapshot.publish(reading(0.0));

        let writer = {
            let snapshot = snapshot.clone();
            thread::spawn(move || {
                for i in 1..=5_000 {
                    snapshot.publish(reading(i as f32));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let snapshot = snapshot.clone();
                thread::spawn(move || {
                    let mut last_version = 0;
                    for _ in 0..5_000 {
                        let (version, current) = snapshot.read_versioned();
                        let current = current.unwrap();
                        let seed = current.pm1_0;
                        assert_eq!(current, reading(seed), "fields from different publishes");
                        assert!(version >= last_version, "version went backwards");
                        last_version = version;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(snapshot.version(), 5_001);
        assert_eq!(snapshot.read(), Some(reading(5_000.0)));
    }
}
