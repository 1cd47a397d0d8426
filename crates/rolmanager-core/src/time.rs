//! Timestamps and clocks
//!
//! Delay enforcement is a comparison between the clock reading at call time
//! and a stored ready time. Nothing ever sleeps, so clocks are synchronous.

use crate::errors::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Whole seconds since the Unix epoch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create from seconds since the epoch
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// `self + delay` rounded up to the next whole second, or `None` if the
    /// result does not fit
    pub fn checked_add(&self, delay: Duration) -> Option<Self> {
        let secs = delay
            .as_secs()
            .checked_add(u64::from(delay.subsec_nanos() > 0))?;
        self.0.checked_add(secs).map(Self)
    }

    /// Time remaining until `later`, zero if already reached
    pub fn until(&self, later: Timestamp) -> Duration {
        Duration::from_secs(later.0.saturating_sub(self.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

/// Accept `delay` only if it is a whole number of seconds
pub fn whole_seconds(delay: Duration) -> Result<Duration> {
    if delay.subsec_nanos() == 0 {
        Ok(delay)
    } else {
        Err(ManagerError::FractionalDelay { delay })
    }
}

/// Source of the current time for delay checks
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Wall clock for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_secs(),
        )
    }
}

/// Simulated clock for tests and scenarios
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// manager and advance another.
#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    current: Arc<AtomicU64>,
}

impl SimulatedClock {
    /// Create a simulated clock starting at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(start.0)),
        }
    }

    /// Advance by `delta`, saturating at the largest timestamp
    pub fn advance(&self, delta: Duration) {
        let secs = delta.as_secs();
        // the closure always returns Some, so the update cannot fail
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(secs))
            });
    }

    /// Set the absolute time
    pub fn set(&self, at: Timestamp) {
        self.current.store(at.0, Ordering::SeqCst);
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.current.load(Ordering::SeqCst))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_clock_shared_between_clones() {
        let clock = SimulatedClock::new(Timestamp(100));
        let observer = clock.clone();
        clock.advance(Duration::from_secs(40));
        assert_eq!(observer.now(), Timestamp(140));
        observer.set(Timestamp(5));
        assert_eq!(clock.now(), Timestamp(5));
    }

    #[test]
    fn test_checked_add_overflow() {
        assert_eq!(
            Timestamp(10).checked_add(Duration::from_secs(30)),
            Some(Timestamp(40))
        );
        assert_eq!(Timestamp(u64::MAX).checked_add(Duration::from_secs(1)), None);
    }

    #[test]
    fn test_checked_add_rounds_fractions_up() {
        assert_eq!(
            Timestamp(1000).checked_add(Duration::from_millis(1900)),
            Some(Timestamp(1002))
        );
        assert_eq!(
            Timestamp(1000).checked_add(Duration::from_millis(2000)),
            Some(Timestamp(1002))
        );
        assert_eq!(
            Timestamp(u64::MAX - 1).checked_add(Duration::from_millis(500)),
            Some(Timestamp(u64::MAX))
        );
        assert_eq!(Timestamp(u64::MAX).checked_add(Duration::from_millis(1)), None);
    }

    #[test]
    fn test_whole_seconds_rejects_fractions() {
        assert_eq!(
            whole_seconds(Duration::from_secs(3)),
            Ok(Duration::from_secs(3))
        );
        assert_eq!(
            whole_seconds(Duration::from_millis(1500)),
            Err(ManagerError::FractionalDelay {
                delay: Duration::from_millis(1500)
            })
        );
    }

    #[test]
    fn test_simulated_clock_saturates_instead_of_wrapping() {
        let clock = SimulatedClock::new(Timestamp(u64::MAX - 10));
        clock.advance(Duration::from_secs(100));
        assert_eq!(clock.now(), Timestamp(u64::MAX));
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now(), Timestamp(u64::MAX));
    }

    #[test]
    fn test_until_saturates() {
        assert_eq!(Timestamp(10).until(Timestamp(40)), Duration::from_secs(30));
        assert_eq!(Timestamp(50).until(Timestamp(40)), Duration::ZERO);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > Timestamp(1_577_836_800));
    }
}
