//! Time provider abstraction
//!
//! The server stamps every finished transition and every generated object id with the
//! current time. This module provides a [`Clock`] trait so that production code reads the
//! system time while tests can use a deterministic clock.
//!
//! # Example
//!
//! ```
//! use objectsync::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let millis = clock.now_millis();
//! assert!(objectsync::clock::format_millis(millis).contains('T'));
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::cell::Cell;

/// A time provider for transition timestamps and id generation.
pub trait Clock: Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Returns the current time as an RFC3339-formatted string.
    fn now_rfc3339(&self) -> String {
        format_millis(self.now_millis())
    }
}

/// Formats milliseconds since Unix epoch as RFC3339.
///
/// Out-of-range values fall back to the epoch.
pub fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock that advances by a fixed step on every read.
///
/// Every call to `now_millis()` returns the current value and then advances it by `step`
/// (zero freezes the clock), so generated ids and transition timestamps are reproducible.
///
/// ```ignore
/// use objectsync::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// assert_eq!(clock.now_millis(), 1000);
/// assert_eq!(clock.now_millis(), 1001);
///
/// let frozen = FixedClock::new(1000).with_step(0);
/// assert_eq!(frozen.now_millis(), frozen.now_millis());
/// ```
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone)]
pub struct FixedClock {
    millis: Cell<u64>,
    step: u64,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a new clock starting at the given time in milliseconds, advancing by one per read.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Cell::new(millis),
            step: 1,
        }
    }

    /// Change how far the clock advances on each read.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.millis.set(self.millis.get() + ms);
    }

    /// Get the current time without advancing.
    pub fn get(&self) -> u64 {
        self.millis.get()
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let t = self.millis.get();
        self.millis.set(t + self.step);
        t
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1704067200000)
    }
}
