//! Sliding-window rate limiter for invitation-code checks.
//!
//! Each caller key gets at most `max_attempts` checks inside any `window`.
//! Rejected attempts are not recorded, so a limited caller regains access
//! as soon as its oldest recorded attempt leaves the window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::error::ConfigError;
use crate::storage::config::RateLimitConfig;

/// Decision for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RateDecision {
    Allowed {
        remaining: u32,
    },
    Limited {
        /// Seconds until the next attempt would be allowed.
        retry_after_secs: i64,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// In-memory sliding-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    max_attempts: u32,
    window: Duration,
    attempts: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            attempts: HashMap::new(),
        }
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a window outside the accepted range.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.max_attempts, config.window()?))
    }

    /// Whether an attempt made at `at` has left the window by `now`.
    /// An attempt whose window end is unrepresentable never expires.
    fn expired(at: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
        at.checked_add_signed(window).is_some_and(|end| end <= now)
    }

    /// Record an attempt by `key` at `now` if the window allows it.
    pub fn check(&mut self, key: &str, now: DateTime<Utc>) -> RateDecision {
        if self.max_attempts == 0 {
            tracing::debug!(key, "rate limiter disabled all attempts");
            return RateDecision::Limited {
                retry_after_secs: self.window.num_seconds(),
            };
        }

        let window = self.window;
        let entries = self.attempts.entry(key.to_string()).or_default();
        while entries.front().is_some_and(|t| Self::expired(*t, window, now)) {
            entries.pop_front();
        }

        if entries.len() as u32 >= self.max_attempts {
            let oldest = entries.front().copied().unwrap_or(now);
            let retry_after = oldest
                .checked_add_signed(window)
                .map_or(i64::MAX, |end| (end - now).num_seconds())
                .max(1);
            tracing::warn!(key, retry_after, "invitation check rate limited");
            return RateDecision::Limited {
                retry_after_secs: retry_after,
            };
        }

        entries.push_back(now);
        RateDecision::Allowed {
            remaining: self.max_attempts - entries.len() as u32,
        }
    }

    /// Drop keys with no attempts inside the window.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.attempts.retain(|_, entries| {
            entries.retain(|t| !Self::expired(*t, window, now));
            !entries.is_empty()
        });
    }

    /// Recorded attempts per key, for persisting between processes.
    pub fn snapshot(&self) -> &HashMap<String, VecDeque<DateTime<Utc>>> {
        &self.attempts
    }

    /// Replace recorded attempts with a saved snapshot.
    pub fn restore(&mut self, attempts: HashMap<String, VecDeque<DateTime<Utc>>>) {
        self.attempts = attempts;
    }
}
