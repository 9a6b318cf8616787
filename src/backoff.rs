//! Retry policy for a full or empty ring.
//!
//! The ring and the multiplexer never block and never retry internally: a
//! failed push and an empty poll both return immediately, and waiting is the
//! integrating system's obligation. [`Backoff`] is the escalation policy this
//! crate ships for that wait, and [`Producer::send`]/[`Consumer::recv`] fold
//! the retry loop around it for callers that just want blocking behavior.

use crate::ring::{Consumer, Full, Producer};
use std::hint;
use std::thread;

/// Escalating wait between retries: busy spins with PAUSE hints that double
/// per call, then thread yields, then [`is_saturated`](Backoff::is_saturated)
/// reports that patience is spent so the caller can park, drop the message,
/// or re-check a stop flag.
///
/// # Example
///
/// ```
/// use timemux::{Backoff, Ring};
///
/// let mut ring: Ring<u64, 4> = Ring::new();
/// let (mut tx, mut rx) = ring.split();
///
/// let mut value = 7;
/// let mut backoff = Backoff::new();
/// loop {
///     match tx.try_push(value) {
///         Ok(()) => break,
///         Err(full) => {
///             value = full.0;
///             if backoff.is_saturated() {
///                 break; // give up, or check a stop flag
///             }
///             backoff.pause();
///         }
///     }
/// }
/// assert_eq!(rx.pop(), Some(7));
/// ```
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10;

    /// Creates a fresh backoff at the lightest step.
    #[inline]
    pub const fn new() -> Self {
        Self { step: 0 }
    }

    /// Waits once and escalates: `2^step` PAUSE hints while below the spin
    /// limit, a thread yield afterwards.
    #[inline]
    pub fn pause(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            for _ in 0..1_u32 << self.step {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }
        if self.step <= Self::YIELD_LIMIT {
            self.step += 1;
        }
    }

    /// True once spinning and yielding are both exhausted. Further `pause`
    /// calls keep yielding; switching strategy is up to the caller.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.step > Self::YIELD_LIMIT
    }

    /// Reset to the lightest step after making progress.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Producer<'_, T, N> {
    /// Pushes `value`, pausing between attempts until the consumer frees a
    /// slot.
    ///
    /// Returns only once the value is in the ring: the consumer must be
    /// draining, or this loops forever. Use
    /// [`try_push`](Producer::try_push) with an explicit [`Backoff`] to bound
    /// the wait or honor a stop flag.
    pub fn send(&mut self, mut value: T) {
        let mut backoff = Backoff::new();
        loop {
            match self.try_push(value) {
                Ok(()) => return,
                Err(Full(rejected)) => {
                    value = rejected;
                    backoff.pause();
                }
            }
        }
    }
}

impl<T, const N: usize> Consumer<'_, T, N> {
    /// Pops the oldest element, pausing between attempts while the ring is
    /// empty.
    ///
    /// Returns only once an element arrives: the producer must still be
    /// pushing, or this loops forever. Use [`pop`](Consumer::pop) with an
    /// explicit [`Backoff`] to bound the wait or honor a stop flag.
    pub fn recv(&mut self) -> T {
        let mut backoff = Backoff::new();
        loop {
            if let Some(value) = self.pop() {
                return value;
            }
            backoff.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ring;

    #[test]
    fn escalation_saturates_and_resets() {
        let mut b = Backoff::new();
        assert!(!b.is_saturated());

        for _ in 0..=Backoff::YIELD_LIMIT {
            b.pause();
        }
        assert!(b.is_saturated());

        // Saturated pauses keep yielding without advancing the step.
        b.pause();
        assert!(b.is_saturated());

        b.reset();
        assert!(!b.is_saturated());
    }

    #[test]
    fn send_recv_round_trip_across_threads() {
        use std::thread;

        let mut ring: Ring<u64, 4> = Ring::new();
        let (mut tx, mut rx) = ring.split();

        // The tiny capacity forces both sides through their backoff loops.
        thread::scope(|s| {
            s.spawn(move || {
                for i in 0..1_000 {
                    tx.send(i);
                }
            });

            for i in 0..1_000 {
                assert_eq!(rx.recv(), i);
            }
        });
    }
}
