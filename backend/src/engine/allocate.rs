//! Timeframe allocation
//!
//! Splits a sample's realized passenger count for one demand across the DCP
//! timeframes according to the demand's booking curve, with `tf_k_factor`
//! controlling how much the per-timeframe shares wobble sample to sample.
//! Every passenger becomes one arrival event at a concrete time inside its
//! timeframe. The returned count is exact by construction (largest-remainder
//! rounding); the caller still asserts it against the realized passenger
//! count, since this is the correctness boundary with the allocator.

use crate::core::time::{dcp_event_time, FIRST_TIMEFRAME_DAYS, SECONDS_PER_DAY};
use crate::engine::{EventKind, SimulationEngine};

impl SimulationEngine {
    /// Distribute `num_pax` discrete arrivals for `demand_idx` across the
    /// DCP timeframes and enqueue one arrival event per passenger.
    ///
    /// `end_time` is the booking horizon's end (the departure instant).
    /// Returns the exact number of events scheduled.
    pub fn allocate_demand_to_tf(
        &mut self,
        demand_idx: usize,
        num_pax: u32,
        tf_k_factor: f64,
        end_time: i64,
    ) -> usize {
        let num_tf = self.num_timeframes();
        if num_tf == 0 || num_pax == 0 {
            return 0;
        }

        // Base weights: booking-curve increments per timeframe.
        let curve_name = {
            let dmd = &self.demands[demand_idx];
            dmd.curve.clone().unwrap_or_else(|| dmd.segment.clone())
        };
        let mut weights: Vec<f64> = match self.curves.get(&curve_name) {
            Some(curve) => {
                let mut prev = 0.0;
                self.dcp_list
                    .iter()
                    .map(|&dcp| {
                        let cum = curve.cumulative_at(dcp);
                        let w = (cum - prev).max(0.0);
                        prev = cum;
                        w
                    })
                    .collect()
            }
            // No curve resolved: spread arrivals evenly.
            None => vec![1.0; num_tf],
        };

        // Perturb the shares, clamped so a frame never goes negative.
        if tf_k_factor > 0.0 {
            for w in &mut weights {
                let shock = 1.0 + tf_k_factor * self.rng.get_normal();
                *w *= shock.max(0.0);
            }
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            weights = vec![1.0; num_tf];
        }
        let total: f64 = weights.iter().sum();

        // Integer split with largest-remainder rounding: sums exactly.
        let shares: Vec<f64> = weights
            .iter()
            .map(|w| w / total * num_pax as f64)
            .collect();
        let mut counts: Vec<u32> = shares.iter().map(|s| s.floor() as u32).collect();
        let assigned: u32 = counts.iter().sum();
        let mut leftover = num_pax - assigned;

        let mut by_remainder: Vec<usize> = (0..num_tf).collect();
        by_remainder.sort_by(|&a, &b| {
            let ra = shares[a] - shares[a].floor();
            let rb = shares[b] - shares[b].floor();
            rb.partial_cmp(&ra)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        for &tf in &by_remainder {
            if leftover == 0 {
                break;
            }
            counts[tf] += 1;
            leftover -= 1;
        }

        // One arrival event per passenger, at a uniform instant inside the
        // timeframe; every timeframe closes at its DCP checkpoint.
        let dcp_hour = self.dcp_hour;
        let mut scheduled = 0usize;
        for (tf_index, &count) in counts.iter().enumerate() {
            let frame_end = dcp_event_time(end_time, self.dcp_list[tf_index], dcp_hour);
            let frame_start = if tf_index == 0 {
                frame_end - FIRST_TIMEFRAME_DAYS * SECONDS_PER_DAY
            } else {
                dcp_event_time(end_time, self.dcp_list[tf_index - 1], dcp_hour)
            };
            let span = (frame_end - frame_start).max(1) as f64;

            for _ in 0..count {
                let offset = (self.rng.next_f64() * span) as i64;
                let time = (frame_start + offset).min(frame_end - 1);
                self.queue.push(
                    time,
                    EventKind::Arrival {
                        demand_idx,
                        tf_index,
                    },
                );
                scheduled += 1;
            }
        }

        self.demands[demand_idx].demand_by_tf = counts;
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::SimulationEngine;
    use crate::models::{BookingCurve, Demand};

    fn engine_with_curve() -> SimulationEngine {
        let mut engine = SimulationEngine::new("test");
        engine.set_dcps(vec![63, 35, 7, 0]);
        engine.set_base_time(1_577_836_800);

        let mut curve = BookingCurve::new("leisure");
        curve.add_dcp(63, 0.1);
        curve.add_dcp(35, 0.4);
        curve.add_dcp(7, 0.8);
        engine.add_curve(curve);

        let mut dmd = Demand::new("BOS", "ORD", "leisure");
        dmd.base_demand = 50.0;
        engine.add_demand(dmd);
        engine.reset_counters();
        engine
    }

    #[test]
    fn test_allocation_count_is_exact() {
        for num_pax in [0u32, 1, 7, 50, 123] {
            let mut engine = engine_with_curve();
            engine.reseed(&[42, 0, 0]);
            let base = engine.base_time();
            let scheduled = engine.allocate_demand_to_tf(0, num_pax, 0.1, base);
            assert_eq!(scheduled as u32, num_pax, "num_pax={}", num_pax);
            assert_eq!(engine.num_events(), num_pax as usize);
        }
    }

    #[test]
    fn test_per_timeframe_counts_sum_to_total() {
        let mut engine = engine_with_curve();
        engine.reseed(&[7, 0, 0]);
        let base = engine.base_time();
        engine.allocate_demand_to_tf(0, 87, 0.1, base);

        let by_tf: u32 = engine.demands()[0].demand_by_tf.iter().sum();
        assert_eq!(by_tf, 87);
    }

    #[test]
    fn test_allocation_is_deterministic_under_reseed() {
        let run = || {
            let mut engine = engine_with_curve();
            engine.reseed(&[42, 1, 2]);
            let base = engine.base_time();
            engine.allocate_demand_to_tf(0, 60, 0.1, base);
            engine.demands()[0].demand_by_tf.clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_zero_tf_k_follows_curve_shape() {
        let mut engine = engine_with_curve();
        engine.reseed(&[42, 0, 0]);
        let base = engine.base_time();
        engine.allocate_demand_to_tf(0, 1000, 0.0, base);

        let counts = engine.demands()[0].demand_by_tf.clone();
        // curve increments: 0.1, 0.3, 0.4, 0.2
        assert_eq!(counts, vec![100, 300, 400, 200]);
    }

    #[test]
    fn test_demand_without_curve_spreads_evenly() {
        let mut engine = SimulationEngine::new("test");
        engine.set_dcps(vec![63, 35, 7, 0]);
        engine.set_base_time(1_577_836_800);
        engine.add_demand(Demand::new("BOS", "ORD", "unknown_segment"));
        engine.reset_counters();
        engine.reseed(&[1, 0, 0]);

        let base = engine.base_time();
        let scheduled = engine.allocate_demand_to_tf(0, 40, 0.0, base);
        assert_eq!(scheduled, 40);
        assert_eq!(engine.demands()[0].demand_by_tf, vec![10, 10, 10, 10]);
    }
}
