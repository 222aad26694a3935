use std::thread;
use std::time::Duration;

use log::{error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreUnavailableSnafu};

/// Bounded exponential backoff for store calls that hit lock contention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Adds up to one extra base delay, chosen at random, to each wait.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn no_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Delay before attempt `attempt + 1`, without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }

    /// Backoff for `attempt` plus, when enabled, up to one base delay of
    /// random jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        if !self.jitter || self.base_delay_ms == 0 {
            return backoff;
        }
        backoff + Duration::from_millis(rand::rng().random_range(0..=self.base_delay_ms))
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or
    /// `max_attempts` transient failures have been seen.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        for attempt in 0..attempts {
            match op() {
                Err(err) if err.is_transient() => {
                    if attempt + 1 == attempts {
                        error!("{what}: giving up after {attempts} attempts: {err}");
                        break;
                    }
                    let delay = self.delay(attempt);
                    warn!(
                        "{what}: {err}, retrying in {:?} (attempt {}/{attempts})",
                        delay,
                        attempt + 1
                    );
                    thread::sleep(delay);
                }
                other => return other,
            }
        }
        StoreUnavailableSnafu { attempts }.fail()
    }
}
