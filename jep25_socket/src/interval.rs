//! Adaptive delay between polls.
//!
//! The interval snaps back to its minimum whenever the server had data for
//! us and grows geometrically while it stays silent:
//!
//! ```
//! use core::time::Duration;
//! use jep25_socket::interval::PollInterval;
//!
//! let mut interval = PollInterval::new(Duration::from_secs(1), Duration::from_secs(30));
//! assert_eq!(interval.back_off(), Duration::from_millis(1250));
//! assert_eq!(interval.back_off(), Duration::from_micros(1_562_500));
//!
//! interval.reset();
//! assert_eq!(interval.current(), Duration::from_secs(1));
//! ```

use core::time::Duration;

/// Growth factor applied after every empty response.
pub const BACKOFF_FACTOR: f64 = 1.25;

/// The current wait between polls, bounded by `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollInterval {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl PollInterval {
    /// Start at `min`.
    ///
    /// A `max` below `min` is raised to `min`.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max: max.max(min),
        }
    }

    /// The current interval.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Lower bound.
    #[must_use]
    pub const fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Return to the minimum after a response that carried data.
    pub const fn reset(&mut self) {
        self.current = self.min;
    }

    /// Grow by [`BACKOFF_FACTOR`] after an empty response, capped at the
    /// maximum. Returns the new interval.
    pub fn back_off(&mut self) -> Duration {
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * BACKOFF_FACTOR)
            .map_or(self.max, |next| next.min(self.max));
        self.current
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(crate::DEFAULT_MIN_POLL_SECS),
            Duration::from_secs(crate::DEFAULT_MAX_POLL_SECS),
        )
    }
}
