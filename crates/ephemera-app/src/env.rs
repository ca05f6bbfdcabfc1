//! Environment backed by the tokio clock.
//!
//! Time is measured from a tokio [`Instant`] taken at construction and added
//! to a base [`Timestamp`], so paused-time tests see the same millisecond
//! values the simulator schedules against.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

use ephemera_core::{Environment, Timestamp};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tokio::time::Instant;

/// Production environment for [`crate::ChatRuntime`].
#[derive(Clone)]
pub struct TokioEnv {
    inner: Arc<Inner>,
}

struct Inner {
    origin: Instant,
    base: Timestamp,
    rng: Mutex<StdRng>,
}

impl TokioEnv {
    /// Environment whose clock reads `base` right now.
    ///
    /// With a seed the RNG is reproducible, otherwise it is seeded from the
    /// OS.
    pub fn new(base: Timestamp, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { inner: Arc::new(Inner { origin: Instant::now(), base, rng: Mutex::new(rng) }) }
    }

    /// Environment anchored at the current wall-clock time.
    pub fn from_system_clock(seed: Option<u64>) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_millis() as u64)
            .unwrap_or_default();
        Self::new(Timestamp::from_millis(millis), seed)
    }

    /// Tokio instant at which the clock reads `at`.
    ///
    /// Timestamps before the base map to the origin.
    pub fn instant_at(&self, at: Timestamp) -> Instant {
        self.inner.origin + at.duration_since(self.inner.base)
    }
}

impl Environment for TokioEnv {
    fn now(&self) -> Timestamp {
        self.inner.base + self.inner.origin.elapsed()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn clock_follows_paused_tokio_time() {
        let env = TokioEnv::new(Timestamp::from_millis(10_000), None);
        assert_eq!(env.now(), Timestamp::from_millis(10_000));

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(env.now(), Timestamp::from_millis(11_500));
    }

    #[tokio::test(start_paused = true)]
    async fn instant_at_round_trips_through_now() {
        let env = TokioEnv::new(Timestamp::from_millis(500), None);
        let target = Timestamp::from_millis(2500);

        tokio::time::sleep_until(env.instant_at(target)).await;
        assert_eq!(env.now(), target);
        let past = env.instant_at(Timestamp::from_millis(0));
        assert_eq!(past, env.instant_at(Timestamp::from_millis(500)));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let draw = || {
            let env = TokioEnv::new(Timestamp::default(), Some(42));
            (env.random_u64(), env.random_u64())
        };
        assert_eq!(draw(), draw());
    }
}
