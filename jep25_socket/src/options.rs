//! Configuration of a polling socket.

use core::time::Duration;

use url::Url;

use crate::{
    DEFAULT_MAX_POLL_SECS, DEFAULT_MIN_POLL_SECS, DEFAULT_NUM_KEYS, error::ConfigError,
    interval::PollInterval,
};

/// Options for an HTTP polling socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// The URL to poll. Required before connecting.
    pub url: Option<Url>,

    /// Minimum time between polls.
    pub min_poll: Duration,

    /// Maximum time between polls.
    pub max_poll: Duration,

    /// Keys generated per chain.
    ///
    /// Larger chains cost more memory and CPU per regeneration but are
    /// regenerated less often.
    pub num_keys: usize,

    /// HTTP proxy for all requests.
    pub proxy: Option<Url>,

    /// Timeout for a single exchange, enforced by the HTTP backend.
    pub request_timeout: Option<Duration>,
}

impl PollOptions {
    /// Default options polling `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self::default().with_url(url)
    }

    /// Set the URL to poll.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Set the poll interval bounds.
    #[must_use]
    pub const fn with_poll_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.min_poll = min;
        self.max_poll = max;
        self
    }

    /// Set the number of keys per chain.
    #[must_use]
    pub const fn with_num_keys(mut self, num_keys: usize) -> Self {
        self.num_keys = num_keys;
        self
    }

    /// Route requests through an HTTP proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Limit how long a single exchange may take.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Check the options and return the polling URL.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the URL is missing, the minimum poll
    /// interval is zero or above the maximum, or the chain length is too
    /// short to link.
    pub fn validate(&self) -> Result<&Url, ConfigError> {
        let url = self.url.as_ref().ok_or(ConfigError::MissingUrl)?;

        if self.min_poll.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }

        if self.min_poll > self.max_poll {
            return Err(ConfigError::InvertedPollBounds {
                min: self.min_poll,
                max: self.max_poll,
            });
        }

        if self.num_keys < jep25_keychain::MIN_CHAIN_LEN {
            return Err(ConfigError::TooFewKeys(self.num_keys));
        }

        Ok(url)
    }

    /// A fresh interval within the configured bounds.
    #[must_use]
    pub fn interval(&self) -> PollInterval {
        PollInterval::new(self.min_poll, self.max_poll)
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            url: None,
            min_poll: Duration::from_secs(DEFAULT_MIN_POLL_SECS),
            max_poll: Duration::from_secs(DEFAULT_MAX_POLL_SECS),
            num_keys: DEFAULT_NUM_KEYS,
            proxy: None,
            request_timeout: None,
        }
    }
}
