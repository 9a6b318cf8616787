//! Lock-free SPSC ring buffer with compile-time capacity.
//!
//! [`Ring<T, N>`] is a fixed-capacity single-producer single-consumer circular
//! buffer. The slot array is embedded directly in the struct (no heap
//! allocation), so `buffer[idx]` is a base+offset calculation the compiler can
//! constant-fold, and a ring can live in a `static` or on the stack.
//!
//! # Index scheme
//!
//! `head` and `tail` are masked indices, always in `0..N`, advanced with
//! `(i + 1) & (N - 1)`. One slot stays permanently free so that `head == tail`
//! unambiguously means empty: the ring holds at most `N - 1` live elements.
//! A slot holds an initialized `T` exactly when its index lies in the circular
//! range `[head, tail)`.
//!
//! # Memory ordering protocol
//!
//! **Producer (`try_push`):**
//! 1. Load `tail` with Relaxed (only the producer writes tail)
//! 2. Load `head` with Acquire (synchronizes with the consumer's Release;
//!    observing an advanced head guarantees the prior occupant's destruction
//!    is visible before we construct into the slot)
//! 3. Write the value into the slot
//! 4. Store `tail` with Release (publishes the write to the consumer)
//!
//! **Consumer (`peek`/`pop`):**
//! 1. Load `head` with Relaxed (only the consumer writes head)
//! 2. Load `tail` with Acquire (observing an advanced tail guarantees the
//!    payload write is visible)
//! 3. Read or move the value out of the slot
//! 4. Store `head` with Release (publishes consumption to the producer)
//!
//! `head` and `tail` live in separate [`CachePadded`] regions so producer and
//! consumer never contend on the same cache line.
//!
//! # Safe surface and raw core
//!
//! [`Ring::split`] borrows the ring exclusively and hands out one
//! [`Producer`] and one [`Consumer`]. The halves encode the access discipline
//! in the type system: each half exists exactly once, so two threads cannot
//! share a side, and the consumer's [`pop`](Consumer::pop) takes `&mut self`,
//! so a reference obtained from [`peek`](Consumer::peek) cannot outlive the
//! pop that frees its slot.
//!
//! The ring's own `push`/`try_push`/`peek`/`pop` are the raw core the halves
//! (and the lane multiplexer) are built on. They take `&self` and are
//! `unsafe`: the caller promises the single-producer single-consumer
//! discipline that the halves otherwise enforce.

use crate::invariants::{debug_assert_live_count, debug_assert_masked_index};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Error returned by [`Producer::try_push`] when the ring is full.
///
/// Carries the rejected value back to the caller, who decides the policy
/// (retry with [`Backoff`](crate::Backoff), drop, or count the overflow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring buffer full")]
pub struct Full<T>(pub T);

/// Compile-time assertion that N is a valid ring capacity.
///
/// N must be a power of 2 for efficient masking (`index & (N - 1)`), and at
/// least 2 because one slot is permanently reserved.
const fn assert_capacity<const N: usize>() {
    assert!(N >= 2, "Ring capacity must be at least 2");
    assert!(N.is_power_of_two(), "Ring capacity must be a power of 2");
}

/// A lock-free SPSC ring buffer with compile-time capacity `N`.
///
/// Holds at most `N - 1` elements; see the module docs for the index scheme
/// and the memory ordering protocol. Split into safe halves before use:
///
/// ```
/// use timemux::Ring;
///
/// let mut ring: Ring<u64, 8> = Ring::new();
/// let (mut tx, mut rx) = ring.split();
///
/// assert!(tx.push(1));
/// assert!(tx.push(2));
///
/// assert_eq!(rx.peek(), Some(&1));
/// assert_eq!(rx.pop(), Some(1));
/// assert_eq!(rx.pop(), Some(2));
/// assert_eq!(rx.pop(), None);
/// ```
#[repr(C)]
pub struct Ring<T, const N: usize> {
    // === CONSUMER HOT ===
    /// Head index (written by consumer, read by producer)
    head: CachePadded<AtomicUsize>,

    // === PRODUCER HOT ===
    /// Tail index (written by producer, read by consumer)
    tail: CachePadded<AtomicUsize>,

    // === DATA BUFFER === (inline, no heap allocation)
    /// Slot array. `UnsafeCell<MaybeUninit<T>>` gives interior mutability
    /// without requiring `T: Default`; initialization is tracked by the
    /// `[head, tail)` range.
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
}

// Safety: Ring is Send + Sync as long as T is Send. The atomics synchronize
// slot hand-off, and same-side races are ruled out by the split halves (or,
// on the raw core, by the caller's unsafe contract).
unsafe impl<T: Send, const N: usize> Send for Ring<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for Ring<T, N> {}

impl<T, const N: usize> Ring<T, N> {
    /// The mask for wrapping indices: `N - 1` (works because N is a power of 2)
    const MASK: usize = N - 1;

    /// Creates a new, empty ring.
    ///
    /// Invalid capacities are rejected when the ring type is instantiated,
    /// as a const-evaluation error at compile time:
    ///
    /// ```compile_fail
    /// let ring = timemux::Ring::<u8, 3>::new(); // not a power of 2
    /// ```
    pub const fn new() -> Self {
        const { assert_capacity::<N>() };

        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            // SAFETY: an array of `UnsafeCell<MaybeUninit<T>>` has no validity
            // requirement, so materializing it uninitialized is sound. This is
            // the standard pattern for const-initializing MaybeUninit arrays.
            buffer: unsafe { MaybeUninit::uninit().assume_init() },
        }
    }

    /// Splits the ring into its producer and consumer halves.
    ///
    /// Both halves borrow the ring for the same lifetime, so exactly one
    /// producer and one consumer exist at a time; each half is `Send` and can
    /// move to its own thread. A second split while the halves are alive is
    /// rejected by the borrow checker:
    ///
    /// ```compile_fail
    /// let mut ring = timemux::Ring::<u64, 8>::new();
    /// let (mut tx_a, _rx) = ring.split();
    /// let (mut tx_b, _) = ring.split();
    /// tx_a.push(1);
    /// tx_b.push(2);
    /// ```
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let ring = &*self;
        (Producer { ring }, Consumer { ring })
    }

    /// Returns the number of usable slots, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the current number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) & Self::MASK
    }

    /// Returns true if the ring holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Returns true if the next push would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    // ---------------------------------------------------------------------
    // RAW PRODUCER CORE
    // ---------------------------------------------------------------------

    /// Attempts to push a value, handing it back in [`Full`] if the ring is
    /// at capacity.
    ///
    /// Never allocates and never blocks; a full ring is an expected,
    /// recoverable condition, not an error escalation. On failure the ring is
    /// unchanged.
    ///
    /// # Safety
    ///
    /// At most one thread at a time may execute producer operations
    /// (`try_push`/`push`) on this ring. Use [`split`](Ring::split) unless
    /// the surrounding structure already guarantees this.
    #[inline]
    pub unsafe fn try_push(&self, value: T) -> Result<(), Full<T>> {
        let tail = self.tail.load(Ordering::Relaxed);
        let next = tail.wrapping_add(1) & Self::MASK;

        // Acquire pairs with the consumer's Release in `pop`: if we observe
        // the advanced head, the previous occupant of `tail` is fully gone.
        if next == self.head.load(Ordering::Acquire) {
            return Err(Full(value));
        }

        debug_assert_masked_index!("tail", tail, N);

        // SAFETY: the slot at `tail` is outside [head, tail), so it holds no
        // live value, and per this function's contract only this producer
        // writes slots at `tail`. The Release store below publishes the write
        // before the consumer can observe the new tail.
        unsafe {
            (*self.buffer[tail].get()).write(value);
        }

        self.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// Pushes a value, returning `false` if the ring is full.
    ///
    /// # Safety
    ///
    /// Same contract as [`try_push`](Ring::try_push): one producer thread at
    /// a time.
    #[inline]
    pub unsafe fn push(&self, value: T) -> bool {
        // SAFETY: forwarded contract.
        unsafe { self.try_push(value).is_ok() }
    }

    // ---------------------------------------------------------------------
    // RAW CONSUMER CORE
    // ---------------------------------------------------------------------

    /// Returns a read-only reference to the oldest element without removing
    /// it, or `None` if the ring is empty.
    ///
    /// # Safety
    ///
    /// At most one thread at a time may execute consumer operations
    /// (`peek`/`pop`) on this ring, and the returned reference must be
    /// released before the next `pop`, which frees the slot it points into.
    #[inline]
    pub unsafe fn peek(&self) -> Option<&T> {
        let head = self.head.load(Ordering::Relaxed);

        // Acquire pairs with the producer's Release in `try_push`.
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }

        debug_assert_masked_index!("head", head, N);

        // SAFETY: head != tail, so the slot at `head` is inside [head, tail)
        // and holds an initialized value published by the producer's Release
        // store. Per this function's contract no pop runs while the returned
        // borrow is alive, so the slot stays live.
        Some(unsafe { (*self.buffer[head].get()).assume_init_ref() })
    }

    /// Removes and returns the oldest element, or `None` if the ring is empty.
    ///
    /// Ownership of the element moves to the caller; the source slot is dead
    /// once this returns.
    ///
    /// # Safety
    ///
    /// Same contract as [`peek`](Ring::peek): one consumer thread at a time,
    /// and no `peek` reference may be alive across this call.
    #[inline]
    pub unsafe fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);

        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }

        debug_assert_masked_index!("head", head, N);
        debug_assert_live_count!(self.len(), N);

        // SAFETY: head != tail, so the slot holds an initialized value (see
        // `peek`). `assume_init_read` moves it out exactly once; the Release
        // store below tells the producer the slot is free for reuse.
        let value = unsafe { (*self.buffer[head].get()).assume_init_read() };

        self.head.store(head.wrapping_add(1) & Self::MASK, Ordering::Release);
        Some(value)
    }
}

/// The write half of a [`Ring`], created by [`Ring::split`].
///
/// Exactly one producer exists per ring and every operation takes
/// `&mut self`, so the single-producer rule is enforced by the borrow checker
/// rather than by convention. `Send` for `T: Send`; move it to the producing
/// thread.
pub struct Producer<'a, T, const N: usize> {
    ring: &'a Ring<T, N>,
}

impl<T, const N: usize> Producer<'_, T, N> {
    /// Attempts to push a value, handing it back in [`Full`] if the ring is
    /// at capacity. Never allocates and never blocks.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), Full<T>> {
        // SAFETY: `split` hands out exactly one Producer and `&mut self`
        // means no other producer call is in flight.
        unsafe { self.ring.try_push(value) }
    }

    /// Pushes a value, returning `false` if the ring is full.
    ///
    /// Prefer [`try_push`](Producer::try_push) when the rejected value must
    /// be retried or inspected; this wrapper discards it.
    #[inline]
    pub fn push(&mut self, value: T) -> bool {
        self.try_push(value).is_ok()
    }

    /// Returns the number of usable slots, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the current number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the ring holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Returns true if the next push would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }
}

/// The read half of a [`Ring`], created by [`Ring::split`].
///
/// [`pop`](Consumer::pop) takes `&mut self` while [`peek`](Consumer::peek)
/// borrows `self` shared, so holding a peeked reference across a pop is a
/// borrow error, not a dangling read:
///
/// ```compile_fail
/// let mut ring = timemux::Ring::<String, 8>::new();
/// let (mut tx, mut rx) = ring.split();
/// tx.push("a".to_owned());
/// let peeked = rx.peek().unwrap();
/// rx.pop();
/// assert_eq!(peeked, "a");
/// ```
pub struct Consumer<'a, T, const N: usize> {
    ring: &'a Ring<T, N>,
}

impl<T, const N: usize> Consumer<'_, T, N> {
    /// Returns a read-only reference to the oldest element without removing
    /// it, or `None` if the ring is empty.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: `split` hands out exactly one Consumer, and the returned
        // borrow keeps `self` shared, so `pop` (`&mut self`) cannot run
        // while it is alive.
        unsafe { self.ring.peek() }
    }

    /// Removes and returns the oldest element, or `None` if the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: single Consumer, and `&mut self` proves no peeked
        // reference is outstanding.
        unsafe { self.ring.pop() }
    }

    /// Returns the number of usable slots, `N - 1`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns the current number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns true if the ring holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<T, const N: usize> Default for Ring<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for Ring<T, N> {
    fn drop(&mut self) {
        // Drain any live slots head-to-tail, dropping each exactly once.
        let mut head = *self.head.get_mut();
        let tail = *self.tail.get_mut();

        while head != tail {
            // SAFETY: slots in [head, tail) are initialized and exclusively
            // ours (&mut self).
            unsafe {
                self.buffer[head].get_mut().assume_init_drop();
            }
            head = head.wrapping_add(1) & Self::MASK;
        }
    }
}
