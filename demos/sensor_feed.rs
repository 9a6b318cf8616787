//! Two sensor feeds at different rates, merged by capture time.
//!
//! An IMU thread and a lidar thread stamp and push into their own lanes; a
//! single consumer polls both types every iteration and so drains the feeds
//! in approximate global timestamp order. Cancellation is a shared stop flag
//! checked in each loop: the queues themselves never block.
//!
//! Run with: `cargo run --example sensor_feed`

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use timemux::{Backoff, Clock, LaneSet, Mux, Timestamped};

#[derive(Debug, Clone, Copy)]
struct ImuSample {
    timestamp: u64,
    accel: [f32; 3],
}

#[derive(Debug, Clone, Copy)]
struct LidarScan {
    timestamp: u64,
    points: u32,
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
    /// IMU and lidar lanes, merged by the stamp each producer applied.
    struct SensorMux {
        imu: ImuSample,
        lidar: LidarScan,
    }
}

fn main() {
    let mux: SensorMux<1024> = SensorMux::new();
    let clock = Clock::new();
    let stop = AtomicBool::new(false);

    thread::scope(|s| {
        // IMU producer, ~1 kHz
        s.spawn(|| {
            while !stop.load(Ordering::Relaxed) {
                let sample = ImuSample {
                    timestamp: clock.now_ns(),
                    accel: [0.0, 0.0, 9.81],
                };
                let mut backoff = Backoff::new();
                while !mux.push(sample) {
                    backoff.pause();
                }
                thread::sleep(Duration::from_millis(1));
            }
        });

        // Lidar producer, ~100 Hz
        s.spawn(|| {
            let mut points = 0;
            while !stop.load(Ordering::Relaxed) {
                let scan = LidarScan {
                    timestamp: clock.now_ns(),
                    points,
                };
                points += 1;
                let mut backoff = Backoff::new();
                while !mux.push(scan) {
                    backoff.pause();
                }
                thread::sleep(Duration::from_millis(10));
            }
        });

        // Single consumer: poll both types every iteration.
        let consumer = s.spawn(|| {
            let mut imu_count = 0_u64;
            let mut lidar_count = 0_u64;
            let mut last_ts = 0_u64;
            let mut inversions = 0_u64;

            while !(stop.load(Ordering::Relaxed) && mux.is_empty()) {
                let mut drained = false;

                if let Some(sample) = mux.try_pop::<ImuSample>() {
                    if sample.timestamp < last_ts {
                        inversions += 1;
                    }
                    last_ts = sample.timestamp;
                    imu_count += 1;
                    drained = true;
                }
                if let Some(scan) = mux.try_pop::<LidarScan>() {
                    if scan.timestamp < last_ts {
                        inversions += 1;
                    }
                    last_ts = scan.timestamp;
                    lidar_count += 1;
                    drained = true;
                }

                if !drained {
                    thread::yield_now();
                }
            }

            (imu_count, lidar_count, inversions)
        });

        thread::sleep(Duration::from_millis(500));
        stop.store(true, Ordering::Relaxed);

        let (imu_count, lidar_count, inversions) = consumer.join().unwrap();
        println!("imu samples:   {imu_count}");
        println!("lidar scans:   {lidar_count}");
        println!("ts inversions: {inversions} (best-effort ordering, so a few are expected)");
    });
}
