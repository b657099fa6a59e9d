//! Bounded retry with exponential backoff for transient transport failures

use std::time::Duration;

/// Policy governing how transient failures are retried
///
/// Only failures classified as transient (see
/// [`Error::is_transient`][crate::Error::is_transient]) consume the retry
/// budget; every other failure surfaces immediately.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: u32,
}

impl Default for RetryPolicy {
    /// Default retry policy
    ///
    /// Allows three retries, starting at 250 ms and doubling on each
    /// subsequent failure, capped at 2 seconds.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Constructs a new retry policy
    ///
    /// The first retry waits `initial_delay`; each subsequent retry waits
    /// `multiplier` times the previous delay, capped at `max_delay`. After
    /// `max_retries` failed retries the original error surfaces.
    pub fn new(
        max_retries: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: u32,
    ) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// A policy that never retries
    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, 1)
    }

    pub(crate) fn backoff(&self) -> Backoff {
        Backoff {
            remaining: self.max_retries,
            next_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
        }
    }
}

/// The stateful sequence of delays drawn from a [`RetryPolicy`]
#[derive(Debug)]
pub(crate) struct Backoff {
    remaining: u32,
    next_delay: Duration,
    max_delay: Duration,
    multiplier: u32,
}

impl Backoff {
    /// Returns the delay to wait before the next retry, or `None` once the
    /// retry budget is exhausted
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let delay = self.next_delay;
        self.next_delay = (delay * self.multiplier).min(self.max_delay);
        Some(delay)
    }
}
