//! Time abstraction
//!
//! Creation times drive "most recent" decisions in the topology builders and
//! the environment `state(at)` query, so tests need to control them.

use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of wall-clock timestamps for entity lifecycles
pub trait Clock: Send + Sync + Debug {
    /// Get the current UTC datetime
    fn now(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
///
/// Every call to [`Clock::now`] advances the clock by `tick` so that
/// consecutively created entities get strictly increasing creation times.
/// A zero tick freezes time, which is useful for exercising the id tiebreak.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    tick: Duration,
}

impl ManualClock {
    /// Start at the given instant, advancing by `tick` per reading
    pub fn new(start: DateTime<Utc>, tick: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            tick,
        }
    }

    /// A clock frozen at the given instant
    pub fn frozen(at: DateTime<Utc>) -> Self {
        Self::new(at, Duration::zero())
    }

    /// Jump forward by `by`
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }

    /// Peek at the current instant without advancing
    pub fn peek(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH, Duration::milliseconds(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock();
        let reading = *current;
        *current += self.tick;
        reading
    }
}
