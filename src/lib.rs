//! timemux - Lock-free SPSC rings merged by timestamp
//!
//! Two pieces:
//!
//! - [`Ring<T, N>`]: a bounded, power-of-two-capacity, single-producer
//!   single-consumer ring buffer, used through the [`Producer`]/[`Consumer`]
//!   halves that [`Ring::split`] hands out. No locks, no allocation after
//!   construction, no blocking: a full push and an empty pop both return
//!   immediately.
//! - A multiplexer, generated by [`define_mux!`], that owns one ring per
//!   message type and merges the streams into a single time-ordered retrieval
//!   surface keyed by each message's embedded timestamp.
//!
//! Retry and backoff live with the caller ([`Backoff`]), timestamps come from
//! a caller-owned [`Clock`], and cancellation is a stop flag in the caller's
//! poll loop; the queues themselves stay non-blocking by design.
//!
//! # Example
//!
//! ```
//! use timemux::{Mux, Timestamped};
//!
//! #[derive(Debug, Clone, Copy)]
//! struct ImuSample { timestamp: u64, accel: [i32; 3] }
//!
//! #[derive(Debug, Clone, Copy)]
//! struct GpsFix { timestamp: u64, lat_e7: i64, lon_e7: i64 }
//!
//! impl Timestamped for ImuSample {
//!     fn timestamp(&self) -> u64 { self.timestamp }
//! }
//! impl Timestamped for GpsFix {
//!     fn timestamp(&self) -> u64 { self.timestamp }
//! }
//!
//! timemux::define_mux! {
//!     struct FeedMux {
//!         imu: ImuSample,
//!         gps: GpsFix,
//!     }
//! }
//!
//! let mux: FeedMux<1024> = FeedMux::new();
//!
//! mux.push(ImuSample { timestamp: 5, accel: [0, 0, 981] });
//! mux.push(GpsFix { timestamp: 3, lat_e7: 0, lon_e7: 0 });
//!
//! // The GPS fix is globally earliest, so the IMU sample is withheld until
//! // the fix is drained. Poll every type per iteration to make progress.
//! assert!(mux.try_pop::<ImuSample>().is_none());
//! assert_eq!(mux.try_pop::<GpsFix>().unwrap().timestamp, 3);
//! assert_eq!(mux.try_pop::<ImuSample>().unwrap().timestamp, 5);
//! ```

mod backoff;
mod clock;
mod invariants;
mod mux;
mod ring;

pub use backoff::Backoff;
pub use clock::Clock;
pub use mux::{Lane, LaneSet, Mux, Timestamped};
pub use ring::{Consumer, Full, Producer, Ring};
