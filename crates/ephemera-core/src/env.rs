//! Environment abstraction for deterministic simulation.
//!
//! The simulator never touches a system clock or entropy source. Production
//! runtimes supply wall-clock time and an OS-seeded RNG; the simulation
//! harness supplies a virtual clock and a seeded RNG so that every run with
//! the same seed produces the same event trace.

use std::time::Duration;

use crate::{config::DelayRange, types::Timestamp};

/// Source of time and randomness.
pub trait Environment: Clone {
    /// Current time.
    ///
    /// Must never go backwards between calls.
    fn now(&self) -> Timestamp;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    /// Uniform sample in `[0, 1)`.
    fn random_unit(&self) -> f64 {
        // 53 bits of mantissa
        (self.random_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    fn random_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.random_u64() % len as u64) as usize
    }

    /// Uniform duration within `range`, millisecond granularity.
    fn random_delay(&self, range: DelayRange) -> Duration {
        let min = u64::try_from(range.min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(range.max.as_millis()).unwrap_or(u64::MAX);
        if max <= min {
            return Duration::from_millis(min);
        }
        match (max - min).checked_add(1) {
            Some(span) => Duration::from_millis(min + self.random_u64() % span),
            // `0..=u64::MAX`
            None => Duration::from_millis(self.random_u64()),
        }
    }
}
