//! Debug assertion macros for ring buffer invariants.
//!
//! Active only in debug builds, so there is zero overhead in release builds.
//! The ring uses masked indices (always `< N`), so the checks here are phrased
//! in terms of the masked scheme rather than unbounded sequence numbers.

/// Assert that a masked index is within the slot array.
///
/// **Invariant**: `0 ≤ index < N` after masking with `N - 1`.
macro_rules! debug_assert_masked_index {
    ($name:literal, $index:expr, $capacity:expr) => {
        debug_assert!(
            $index < $capacity,
            "{} index {} outside slot array of {} slots",
            $name,
            $index,
            $capacity
        )
    };
}

/// Assert that the live-element count respects the reserved slot.
///
/// **Invariant**: `(tail - head) mod N ≤ N - 1`; one slot always stays free
/// so that `head == tail` unambiguously means empty.
macro_rules! debug_assert_live_count {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity - 1,
            "live count {} exceeds usable capacity {}",
            $len,
            $capacity - 1
        )
    };
}

pub(crate) use debug_assert_live_count;
pub(crate) use debug_assert_masked_index;
