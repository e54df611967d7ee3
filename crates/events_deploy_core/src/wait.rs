//! Bounded polling with exponential backoff.
//!
//! Every blocking wait in a deployment goes through [`poll_until`] and a
//! [`Sleeper`], so tests can observe the requested delays without sleeping.

use std::time::Duration;

use tracing::debug;

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            factor: 2,
            max_delay: Duration::from_secs(20),
            max_attempts: 12,
        }
    }
}

impl Backoff {
    /// Delay to wait after the zero-based `attempt` came back pending.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial
            .saturating_mul(self.factor.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll<T> {
    Ready(T),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitError<E> {
    Failed(E),
    Exhausted { attempts: u32 },
}

pub fn poll_until<T, E>(
    backoff: &Backoff,
    sleeper: &dyn Sleeper,
    resource: &str,
    mut check: impl FnMut() -> Result<Poll<T>, E>,
) -> Result<T, WaitError<E>> {
    for attempt in 0..backoff.max_attempts {
        match check().map_err(WaitError::Failed)? {
            Poll::Ready(value) => return Ok(value),
            Poll::Pending => {
                if attempt + 1 < backoff.max_attempts {
                    let delay = backoff.delay_for(attempt);
                    debug!(resource, attempt, ?delay, "not ready yet");
                    sleeper.sleep(delay);
                }
            }
        }
    }

    Err(WaitError::Exhausted {
        attempts: backoff.max_attempts,
    })
}
