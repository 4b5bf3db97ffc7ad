//! Shared test utilities for storage consumers.
//!
//! Gated behind the `testutil` feature to keep test doubles out of
//! production builds.
//!
//! # Usage
//!
//! In a consumer's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cakewalk-storage = { path = "../storage", features = ["testutil"] }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::clock::Clock;

/// A manually-advanced [`Clock`] for deterministic time-dependent tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Creates a clock frozen at the given epoch-seconds instant.
    ///
    /// # Panics
    ///
    /// Panics if the timestamp is out of chrono's representable range.
    #[must_use]
    pub fn at_epoch_seconds(secs: i64) -> Self {
        Self::new(DateTime::<Utc>::from_timestamp(secs, 0).expect("timestamp in range"))
    }

    /// Moves the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if the duration is out of chrono's representable range.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(by).expect("duration in range");
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
