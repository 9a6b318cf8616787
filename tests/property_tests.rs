//! Property-based tests for the ring invariants and the timestamp merge.

use proptest::prelude::*;
use std::collections::VecDeque;
use timemux::{Mux, Ring, Timestamped};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Alpha {
    timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Beta {
    timestamp: u64,
}

impl Timestamped for Alpha {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for Beta {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

timemux::define_mux! {
    struct PairMux {
        alpha: Alpha,
        beta: Beta,
    }
}

proptest! {
    /// The ring agrees with a VecDeque model over any interleaving of pushes
    /// and pops: same acceptance, same values, same length, never over
    /// capacity.
    #[test]
    fn ring_matches_queue_model(ops in prop::collection::vec(any::<bool>(), 1..200)) {
        const CAP: usize = 16;
        let mut ring: Ring<u32, CAP> = Ring::new();
        let (mut tx, mut rx) = ring.split();
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next = 0_u32;

        for push_op in ops {
            if push_op {
                let accepted = tx.push(next);
                if model.len() < CAP - 1 {
                    prop_assert!(accepted);
                    model.push_back(next);
                } else {
                    prop_assert!(!accepted, "push accepted beyond usable capacity");
                }
                next += 1;
            } else {
                prop_assert_eq!(rx.pop(), model.pop_front());
            }

            prop_assert_eq!(rx.len(), model.len());
            prop_assert!(rx.len() <= rx.capacity());
            prop_assert_eq!(rx.is_empty(), model.is_empty());
        }

        // Drain and compare the tail of the model.
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(rx.pop(), Some(expected));
        }
        prop_assert!(rx.is_empty());
    }

    /// Any batch smaller than the usable capacity comes back in push order.
    #[test]
    fn ring_fifo(values in prop::collection::vec(any::<u64>(), 0..63)) {
        let mut ring: Ring<u64, 64> = Ring::new();
        let (mut tx, mut rx) = ring.split();

        for &v in &values {
            prop_assert!(tx.push(v));
        }
        for &v in &values {
            prop_assert_eq!(rx.pop(), Some(v));
        }
        prop_assert_eq!(rx.pop(), None);
    }

    /// Peek always mirrors the next pop.
    #[test]
    fn peek_previews_pop(values in prop::collection::vec(any::<u16>(), 1..30)) {
        let mut ring: Ring<u16, 32> = Ring::new();
        let (mut tx, mut rx) = ring.split();

        for &v in &values {
            prop_assert!(tx.push(v));
        }
        for _ in 0..values.len() {
            let previewed = rx.peek().copied();
            prop_assert_eq!(rx.pop(), previewed);
        }
    }

    /// With per-lane non-decreasing stamps all pushed up front, a consumer
    /// polling both types drains a globally sorted merge containing every
    /// message.
    #[test]
    fn merge_of_sorted_lanes_is_sorted(
        mut alpha_ts in prop::collection::vec(0_u64..1_000, 0..100),
        mut beta_ts in prop::collection::vec(0_u64..1_000, 0..100),
    ) {
        alpha_ts.sort_unstable();
        beta_ts.sort_unstable();

        let mux: PairMux<128> = PairMux::new();
        for &timestamp in &alpha_ts {
            prop_assert!(mux.push(Alpha { timestamp }), "push Alpha failed");
        }
        for &timestamp in &beta_ts {
            prop_assert!(mux.push(Beta { timestamp }), "push Beta failed");
        }

        let mut merged = Vec::new();
        loop {
            let mut drained = false;
            if let Some(msg) = mux.try_pop::<Alpha>() {
                merged.push(msg.timestamp);
                drained = true;
            }
            if let Some(msg) = mux.try_pop::<Beta>() {
                merged.push(msg.timestamp);
                drained = true;
            }
            if !drained {
                break;
            }
        }

        prop_assert_eq!(merged.len(), alpha_ts.len() + beta_ts.len());
        prop_assert!(merged.windows(2).all(|w| w[0] <= w[1]), "merge not sorted: {:?}", merged);

        let mut expected = [alpha_ts, beta_ts].concat();
        expected.sort_unstable();
        prop_assert_eq!(merged, expected);
    }

    /// try_pop for a type whose lane does not hold the global minimum never
    /// yields, and never disturbs either lane.
    #[test]
    fn withheld_lane_is_untouched(
        alpha_head in 0_u64..1_000,
        beta_head in 0_u64..1_000,
    ) {
        prop_assume!(alpha_head != beta_head);

        let mux: PairMux<8> = PairMux::new();
        prop_assert!(mux.push(Alpha { timestamp: alpha_head }), "push Alpha failed");
        prop_assert!(mux.push(Beta { timestamp: beta_head }), "push Beta failed");

        if alpha_head < beta_head {
            prop_assert!(mux.try_pop::<Beta>().is_none());
            prop_assert_eq!(mux.try_pop::<Alpha>(), Some(Alpha { timestamp: alpha_head }));
        } else {
            prop_assert!(mux.try_pop::<Alpha>().is_none());
            prop_assert_eq!(mux.try_pop::<Beta>(), Some(Beta { timestamp: beta_head }));
        }
    }
}
