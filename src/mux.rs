//! Timestamp-ordered multiplexing of typed SPSC streams.
//!
//! A multiplexer owns one [`Ring`](crate::Ring) lane per message type, listed
//! in a fixed declaration order, and merges the lanes into a single
//! time-ordered retrieval surface. Routing is static: a message of type `M`
//! always goes to and only to `M`'s lane, resolved at compile time with no
//! runtime type tag.
//!
//! Concrete multiplexers are generated by [`define_mux!`](crate::define_mux)
//! from an explicit list of message kinds; the generated struct implements
//! [`LaneSet`] and one [`Lane<M>`] per kind, and the blanket [`Mux`] trait
//! supplies `push`/`try_pop` on top. Listing the same message type twice
//! fails to compile with conflicting `Lane` impls.
//!
//! # Retrieval model
//!
//! There is no "next message of any type" call. [`Mux::try_pop`] executes a
//! fresh scan on every call: it peeks the head of every lane in declaration
//! order, finds the minimum timestamp (strict `<`, so ties go to the
//! earliest-declared lane), and yields a value only if the winning lane is
//! the one the caller asked for. A consumer drains the streams in approximate
//! global timestamp order by polling `try_pop` for every managed type in a
//! loop; skipping a type risks starving the others, because its lane can
//! hold the global minimum and every other lane is then withheld.
//!
//! The decision is a snapshot: pushes that land between the scan and the pop
//! are not accounted for, so cross-type ordering is best-effort, not
//! linearizable. No state is cached across calls.
//!
//! # Access discipline
//!
//! One producer thread per lane (two threads pushing the same message type is
//! a data race on that lane). All `try_pop` calls, for every type, must come
//! from a single consuming thread: the scan-then-pop sequence is not atomic
//! across lanes, and concurrent consumers working from momentarily stale
//! snapshots can each conclude "not my turn" and under-deliver.
//!
//! The generated lanes forward to the rings' raw single-producer
//! single-consumer operations under this contract; a multiplexer shared
//! outside the discipline races on the affected lane.

/// A message carrying an unsigned 64-bit timestamp.
///
/// The multiplexer never reads a clock itself; producers stamp messages
/// before pushing, typically from a [`Clock`](crate::Clock).
pub trait Timestamped {
    /// The embedded timestamp used for cross-stream ordering.
    fn timestamp(&self) -> u64;
}

/// A fixed, ordered set of ring lanes. Implemented by [`define_mux!`](crate::define_mux).
pub trait LaneSet {
    /// Number of lanes in declaration order.
    const LANES: usize;

    /// Scans the head element of every lane and returns the index of the lane
    /// holding the minimum timestamp, or `None` if every lane is empty.
    ///
    /// Ties are broken in favor of the earliest-declared lane.
    fn earliest(&self) -> Option<usize>;

    /// Returns true if every lane is empty.
    fn is_empty(&self) -> bool;
}

/// Access to the lane owning message type `M`. Implemented by
/// [`define_mux!`](crate::define_mux) once per declared message kind.
pub trait Lane<M>: LaneSet {
    /// Position of `M`'s lane in declaration order.
    const INDEX: usize;

    /// Pushes onto `M`'s lane; `false` means the lane is full.
    fn push_lane(&self, msg: M) -> bool;

    /// Pops the oldest element of `M`'s lane, regardless of other lanes.
    fn pop_lane(&self) -> Option<M>;
}

/// Time-ordered push/pop surface, blanket-implemented for every [`LaneSet`].
pub trait Mux: LaneSet {
    /// Routes `msg` to its lane by static type. Returns `false` if that lane
    /// is full; the other lanes are never considered.
    #[inline]
    fn push<M>(&self, msg: M) -> bool
    where
        Self: Lane<M>,
    {
        self.push_lane(msg)
    }

    /// Pops a message of type `M` if and only if `M`'s lane currently holds
    /// the globally earliest pending timestamp.
    ///
    /// Returns `None` when every lane is empty, and also when `M`'s lane has
    /// data but some other lane's head is earlier; the value is withheld
    /// until the caller drains the earlier lane. Poll every managed type per
    /// iteration to guarantee progress.
    #[inline]
    fn try_pop<M>(&self) -> Option<M>
    where
        Self: Lane<M>,
    {
        match self.earliest() {
            // The winning lane is M's own lane, so this pop cannot miss:
            // a single consumer means nobody drained it since the scan.
            Some(lane) if lane == <Self as Lane<M>>::INDEX => self.pop_lane(),
            _ => None,
        }
    }
}

impl<T: LaneSet + ?Sized> Mux for T {}

/// Defines a multiplexer struct over an explicit, ordered list of message
/// types.
///
/// The generated struct is generic over the per-lane ring capacity `N` (a
/// power of two) and owns one `Ring<M, N>` per listed type. It implements
/// [`LaneSet`], one [`Lane<M>`] per type, [`Default`], and a `const fn new()`.
/// Declaration order is tie-break order.
///
/// Every listed type must implement [`Timestamped`]; listing a type twice is
/// a compile error (conflicting `Lane` impls).
///
/// # Example
///
/// ```
/// use timemux::{Mux, Timestamped};
///
/// #[derive(Debug, Clone, Copy)]
/// struct Tick { timestamp: u64 }
///
/// #[derive(Debug, Clone, Copy)]
/// struct Quote { timestamp: u64, price: u32 }
///
/// impl Timestamped for Tick {
///     fn timestamp(&self) -> u64 { self.timestamp }
/// }
/// impl Timestamped for Quote {
///     fn timestamp(&self) -> u64 { self.timestamp }
/// }
///
/// timemux::define_mux! {
///     struct FeedMux {
///         ticks: Tick,
///         quotes: Quote,
///     }
/// }
///
/// let mux: FeedMux<16> = FeedMux::new();
/// assert!(mux.push(Tick { timestamp: 5 }));
/// assert!(mux.push(Quote { timestamp: 3, price: 100 }));
///
/// // The quote is globally earliest, so the tick is withheld.
/// assert!(mux.try_pop::<Tick>().is_none());
/// assert_eq!(mux.try_pop::<Quote>().unwrap().timestamp, 3);
/// assert_eq!(mux.try_pop::<Tick>().unwrap().timestamp, 5);
/// ```
#[macro_export]
macro_rules! define_mux {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$lane_meta:meta])* $lane:ident : $msg:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<const N: usize> {
            $( $(#[$lane_meta])* $lane: $crate::Ring<$msg, N>, )+
        }

        impl<const N: usize> $name<N> {
            /// Creates the multiplexer with every lane empty.
            $vis const fn new() -> Self {
                Self {
                    $( $lane: $crate::Ring::new(), )+
                }
            }
        }

        impl<const N: usize> ::core::default::Default for $name<N> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<const N: usize> $crate::LaneSet for $name<N> {
            const LANES: usize = [$( stringify!($lane) ),+].len();

            fn earliest(&self) -> ::core::option::Option<usize> {
                let mut min_ts = u64::MAX;
                let mut winner = ::core::option::Option::None;
                let mut index = 0_usize;
                $(
                    // SAFETY: earliest() runs on the single consuming thread
                    // (module docs), and the peeked borrow dies inside this
                    // scan, before any pop.
                    if let ::core::option::Option::Some(msg) = unsafe { self.$lane.peek() } {
                        // Strict `<`: on a tie the earliest-declared lane wins.
                        let ts = $crate::Timestamped::timestamp(msg);
                        if ts < min_ts {
                            min_ts = ts;
                            winner = ::core::option::Option::Some(index);
                        }
                    }
                    index += 1;
                )+
                let _ = index;
                winner
            }

            fn is_empty(&self) -> bool {
                true $( && self.$lane.is_empty() )+
            }
        }

        $crate::__define_mux_lanes!($name; 0; $( $lane : $msg ),+);
    };
}

/// Internal helper for [`define_mux!`]: assigns declaration-order indices.
#[doc(hidden)]
#[macro_export]
macro_rules! __define_mux_lanes {
    ($name:ident; $index:expr;) => {};
    (
        $name:ident; $index:expr;
        $lane:ident : $msg:ty
        $(, $rest_lane:ident : $rest_msg:ty)*
    ) => {
        impl<const N: usize> $crate::Lane<$msg> for $name<N> {
            const INDEX: usize = $index;

            #[inline]
            fn push_lane(&self, msg: $msg) -> bool {
                // SAFETY: one producer thread per lane, per the access
                // discipline in the module docs.
                unsafe { self.$lane.push(msg) }
            }

            #[inline]
            fn pop_lane(&self) -> ::core::option::Option<$msg> {
                // SAFETY: all pops come from the single consuming thread,
                // which holds no peeked borrow across this call.
                unsafe { self.$lane.pop() }
            }
        }

        $crate::__define_mux_lanes!($name; $index + 1; $( $rest_lane : $rest_msg ),*);
    };
}
