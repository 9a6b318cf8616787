//! Threaded stress tests: one producer per lane, one consumer, real threads.
//!
//! Run under a race-sensitive harness where available (e.g.
//! `RUSTFLAGS="-Z sanitizer=thread"` on nightly); the assertions themselves
//! only need a plain `cargo test`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use timemux::{Backoff, Mux, Ring, Timestamped};

#[derive(Debug, Clone, Copy)]
struct ImuSample {
    timestamp: u64,
}

#[derive(Debug, Clone, Copy)]
struct LidarScan {
    timestamp: u64,
}

impl Timestamped for ImuSample {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for LidarScan {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

timemux::define_mux! {
    struct SensorMux {
        imu: ImuSample,
        lidar: LidarScan,
    }
}

/// One producer pushing N items, one consumer popping concurrently: exactly N
/// items come out, in push order, with no loss or duplication.
#[test]
fn spsc_stress_preserves_order_and_count() {
    const ITEMS: u64 = 200_000;

    let mut ring: Ring<u64, 1024> = Ring::new();
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..ITEMS {
                tx.send(i);
            }
        });

        let mut backoff = Backoff::new();
        for expected in 0..ITEMS {
            loop {
                if let Some(value) = rx.pop() {
                    assert_eq!(value, expected, "out-of-order or corrupted pop");
                    backoff.reset();
                    break;
                }
                backoff.pause();
            }
        }

        assert!(rx.is_empty());
    });
}

/// Repeated short runs to vary thread interleavings around the wrap and full
/// boundaries of a tiny ring.
#[test]
fn spsc_stress_tiny_ring() {
    const ITEMS: u32 = 20_000;

    for _ in 0..8 {
        let mut ring: Ring<u32, 4> = Ring::new();
        let (mut tx, mut rx) = ring.split();

        thread::scope(|s| {
            s.spawn(move || {
                for i in 0..ITEMS {
                    tx.send(i);
                }
            });

            for expected in 0..ITEMS {
                assert_eq!(rx.recv(), expected);
            }
        });
    }
}

/// Two producers (one per lane) against a single polling consumer: every
/// message arrives exactly once and per-lane FIFO order survives the merge.
#[test]
fn mux_stress_two_lanes() {
    const PER_LANE: u64 = 50_000;

    let mux: SensorMux<256> = SensorMux::new();
    let imu_done = AtomicBool::new(false);
    let lidar_done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..PER_LANE {
                let sample = ImuSample { timestamp: i * 2 };
                while !mux.push(sample) {
                    std::hint::spin_loop();
                }
            }
            imu_done.store(true, Ordering::Release);
        });

        s.spawn(|| {
            for i in 0..PER_LANE {
                let scan = LidarScan { timestamp: i * 2 + 1 };
                while !mux.push(scan) {
                    std::hint::spin_loop();
                }
            }
            lidar_done.store(true, Ordering::Release);
        });

        let mut imu_seen = 0_u64;
        let mut lidar_seen = 0_u64;
        let mut last_imu_ts = None;
        let mut last_lidar_ts = None;

        loop {
            let mut drained = false;

            // Poll every lane each iteration; skipping one would starve the
            // other behind a withheld minimum.
            if let Some(sample) = mux.try_pop::<ImuSample>() {
                if let Some(last) = last_imu_ts {
                    assert!(sample.timestamp > last, "IMU lane order violated");
                }
                last_imu_ts = Some(sample.timestamp);
                imu_seen += 1;
                drained = true;
            }
            if let Some(scan) = mux.try_pop::<LidarScan>() {
                if let Some(last) = last_lidar_ts {
                    assert!(scan.timestamp > last, "lidar lane order violated");
                }
                last_lidar_ts = Some(scan.timestamp);
                lidar_seen += 1;
                drained = true;
            }

            if !drained {
                if imu_seen == PER_LANE
                    && lidar_seen == PER_LANE
                    && imu_done.load(Ordering::Acquire)
                    && lidar_done.load(Ordering::Acquire)
                {
                    break;
                }
                std::hint::spin_loop();
            }
        }

        assert_eq!(imu_seen, PER_LANE);
        assert_eq!(lidar_seen, PER_LANE);
    });
}

/// With all messages pushed before polling begins, the merge is exactly
/// globally sorted, not just best-effort.
#[test]
fn mux_pre_filled_merge_is_sorted() {
    let mux: SensorMux<256> = SensorMux::new();

    for i in 0..100 {
        assert!(mux.push(ImuSample { timestamp: i * 3 }));
        assert!(mux.push(LidarScan { timestamp: i * 3 + 1 }));
    }

    let mut merged = Vec::new();
    loop {
        let mut drained = false;
        if let Some(sample) = mux.try_pop::<ImuSample>() {
            merged.push(sample.timestamp);
            drained = true;
        }
        if let Some(scan) = mux.try_pop::<LidarScan>() {
            merged.push(scan.timestamp);
            drained = true;
        }
        if !drained {
            break;
        }
    }

    assert_eq!(merged.len(), 200);
    assert!(merged.windows(2).all(|w| w[0] < w[1]));
}
