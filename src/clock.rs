//! Monotonic timestamp source for stamping messages.
//!
//! The queues never read wall-clock time; producers stamp each message before
//! pushing it, and this clock is the collaborator that supplies the stamp.

use std::time::{Duration, Instant};

/// A monotonic clock anchored at construction.
///
/// All producers stamping into one multiplexer should share a single `Clock`
/// (by reference) so their timestamps are mutually comparable.
///
/// # Example
///
/// ```
/// use timemux::Clock;
///
/// let clock = Clock::new();
/// let a = clock.now_ns();
/// let b = clock.now_ns();
/// assert!(b >= a);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    /// Creates a clock whose zero point is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since the clock was created.
    ///
    /// Monotonic and non-decreasing. Saturates after ~584 years.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    /// Elapsed time since the clock was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
