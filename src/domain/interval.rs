//! Interval value object
//!
//! Used for the watch poll interval and the launch/capture timeouts.

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::IntervalParseError;

/// Default watch poll interval (2 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default bound for browser launch and page settle (10 seconds)
pub const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 10_000;

/// Value object representing a positive span of time.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    milliseconds: u64,
}

impl Interval {
    /// Create an Interval from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create an Interval from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// Default watch poll interval
    pub const fn default_poll() -> Self {
        Self::from_millis(DEFAULT_POLL_INTERVAL_MS)
    }

    /// Default launch timeout
    pub const fn default_launch_timeout() -> Self {
        Self::from_millis(DEFAULT_LAUNCH_TIMEOUT_MS)
    }

    /// Get interval in whole seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get interval in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Interval {
    type Err = IntervalParseError;

    /// Parse strings like "500ms", "2s", "1m", "1m30s".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IntervalParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();

        let mut total_ms: u64 = 0;
        let mut current_num = String::new();
        let mut found_any = false;
        let mut chars = input.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch.is_ascii_digit() {
                current_num.push(ch);
                continue;
            }
            if current_num.is_empty() {
                return Err(err());
            }
            let value: u64 = current_num.parse().map_err(|_| err())?;
            let unit_ms = match ch {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                'm' => 60_000,
                's' => 1_000,
                _ => return Err(err()),
            };
            total_ms = value
                .checked_mul(unit_ms)
                .and_then(|v| total_ms.checked_add(v))
                .ok_or_else(err)?;
            current_num.clear();
            found_any = true;
        }

        if !current_num.is_empty() || !found_any || total_ms == 0 {
            return Err(err());
        }

        Ok(Self {
            milliseconds: total_ms,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.milliseconds % 1000;
        let total_secs = self.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;

        if ms != 0 {
            return write!(f, "{}ms", self.milliseconds);
        }
        if minutes == 0 {
            write!(f, "{}s", seconds)
        } else if seconds == 0 {
            write!(f, "{}m", minutes)
        } else {
            write!(f, "{}m{}s", minutes, seconds)
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::default_poll()
    }
}

impl From<Interval> for StdDuration {
    fn from(interval: Interval) -> Self {
        interval.as_std()
    }
}
