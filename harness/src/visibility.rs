//! Waiting for committed objects to become visible to readers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HarnessError;

/// Capped exponential backoff with a bounded number of attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityPolicy {
    /// Delay after the first failed attempt.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay.
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Total attempts, including the first.
    pub max_attempts: u32,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_delay_ms: 4_000,
            multiplier: 2.0,
            max_attempts: 8,
        }
    }
}

impl VisibilityPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let millis = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(millis as u64)
    }

    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.max_attempts == 0 {
            return Err(HarnessError::Config(
                "visibility.max_attempts must be at least 1".into(),
            ));
        }
        if !(self.multiplier >= 1.0) {
            return Err(HarnessError::Config(
                "visibility.multiplier must be >= 1.0".into(),
            ));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(HarnessError::Config(
                "visibility.initial_delay_ms exceeds max_delay_ms".into(),
            ));
        }
        Ok(())
    }
}

/// Source of delays between attempts.
pub trait Sleeper {
    fn sleep(&mut self, delay: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Records requested delays without sleeping.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    pub delays: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, delay: Duration) {
        self.delays.push(delay);
    }
}

/// Run `fetch` until it succeeds, retrying transient failures per `policy`.
///
/// Non-transient errors are returned immediately. When attempts run out the
/// last transient error is returned.
pub fn wait_for_visibility<T, S, F>(
    policy: &VisibilityPolicy,
    sleeper: &mut S,
    what: &str,
    mut fetch: F,
) -> Result<T, HarnessError>
where
    S: Sleeper + ?Sized,
    F: FnMut() -> Result<T, HarnessError>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && policy.should_retry(attempt) => {
                let delay = policy.delay_for_attempt(attempt);
                debug!(what, attempt, delay_ms = delay.as_millis() as u64, %err, "not visible yet");
                sleeper.sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}
