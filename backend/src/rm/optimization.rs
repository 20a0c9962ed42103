//! Optimization step
//!
//! Leg-level EMSR-b heuristic. Buckets are ranked by decision fare;
//! protection for the top classes against each cheaper class is the
//! aggregate forecast mean plus a normal quantile of the aggregate
//! deviation, where the quantile level is the cheaper fare relative to the
//! demand-weighted fare of the protected classes. The cheaper class's
//! allocation is the capacity remaining after that protection.

use crate::config::StepSpec;
use crate::engine::SimulationEngine;
use crate::error::{ConfigError, StepFailure};
use crate::models::Leg;
use crate::rm::{tags, RmStep};
use serde::Deserialize;
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptimizationParams {
    #[serde(default = "default_algorithm")]
    algorithm: String,
}

fn default_algorithm() -> String {
    "emsrb".to_string()
}

/// EMSR-b seat allocation.
pub struct OptimizationStep {
    name: String,
}

impl OptimizationStep {
    pub fn from_spec(spec: &StepSpec) -> Result<Box<dyn RmStep>, ConfigError> {
        let params: OptimizationParams =
            serde_json::from_value(serde_json::Value::Object(spec.params.clone())).map_err(
                |e| ConfigError::InvalidStepParams {
                    step_type: "optimization".to_string(),
                    message: e.to_string(),
                },
            )?;
        if params.algorithm != "emsrb" {
            return Err(ConfigError::InvalidStepParams {
                step_type: "optimization".to_string(),
                message: format!("unknown algorithm {:?}", params.algorithm),
            });
        }
        Ok(Box::new(Self {
            name: spec.name.clone(),
        }))
    }
}

impl RmStep for OptimizationStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn step_type(&self) -> &str {
        "optimization"
    }

    fn requires(&self) -> Vec<String> {
        vec![tags::LEG_FORECAST.to_string()]
    }

    fn produces(&self) -> Vec<String> {
        vec![tags::LEG_ALLOCATIONS.to_string()]
    }

    fn run(
        &mut self,
        engine: &mut SimulationEngine,
        airline: &str,
        _dcp_index: usize,
        _dcp: u32,
    ) -> Result<(), StepFailure> {
        for leg in engine.legs_mut().iter_mut() {
            if leg.carrier != airline {
                continue;
            }
            emsrb(leg);
        }
        Ok(())
    }
}

/// Recompute bucket allocations on one leg from the current forecasts.
fn emsrb(leg: &mut Leg) {
    let capacity = leg.capacity;
    let n = leg.buckets.len();
    if n == 0 {
        return;
    }

    let total_forecast: f64 = leg.buckets.iter().map(|b| b.fcst_mean).sum();
    if total_forecast <= 0.0 {
        // No usable forecast yet (burn-in): keep every class wide open.
        for bucket in &mut leg.buckets {
            bucket.alloc = capacity;
        }
        return;
    }

    // Rank buckets by decision fare, highest first.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        leg.buckets[b]
            .decision_fare
            .partial_cmp(&leg.buckets[a].decision_fare)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let unit_normal = Normal::new(0.0, 1.0).expect("unit normal");

    leg.buckets[order[0]].alloc = capacity;

    let mut agg_mean = 0.0;
    let mut agg_var = 0.0;
    let mut agg_fare_demand = 0.0;
    for k in 0..n - 1 {
        let bucket = &leg.buckets[order[k]];
        agg_mean += bucket.fcst_mean;
        agg_var += bucket.fcst_std_dev * bucket.fcst_std_dev;
        agg_fare_demand += bucket.decision_fare * bucket.fcst_mean;

        let next_fare = leg.buckets[order[k + 1]].decision_fare;
        let fare_bar = if agg_mean > 0.0 {
            agg_fare_demand / agg_mean
        } else {
            leg.buckets[order[k]].decision_fare
        };

        let protection = if fare_bar <= 0.0 || next_fare >= fare_bar {
            // Cheaper class pays as much as the protected bundle: nothing
            // to protect.
            0.0
        } else {
            let p = (1.0 - next_fare / fare_bar).clamp(1e-6, 1.0 - 1e-6);
            let z = unit_normal.inverse_cdf(p);
            (agg_mean + z * agg_var.sqrt()).clamp(0.0, capacity)
        };

        leg.buckets[order[k + 1]].alloc = (capacity - protection).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bucket;

    fn leg_with_buckets(buckets: Vec<Bucket>) -> Leg {
        let mut leg = Leg::new("AL1", 101, "BOS", "ORD", 100.0);
        for b in buckets {
            leg.add_bucket(b);
        }
        leg
    }

    fn bucket(class: &str, fare: f64, mean: f64, std_dev: f64) -> Bucket {
        let mut b = Bucket::new(class, 100.0);
        b.decision_fare = fare;
        b.fcst_mean = mean;
        b.fcst_std_dev = std_dev;
        b
    }

    #[test]
    fn test_no_forecast_keeps_everything_open() {
        let mut leg = leg_with_buckets(vec![
            bucket("Y1", 400.0, 0.0, 0.0),
            bucket("Y2", 200.0, 0.0, 0.0),
        ]);
        emsrb(&mut leg);
        assert_eq!(leg.buckets[0].alloc, 100.0);
        assert_eq!(leg.buckets[1].alloc, 100.0);
    }

    #[test]
    fn test_cheap_class_is_limited_when_demand_is_strong() {
        let mut leg = leg_with_buckets(vec![
            bucket("Y1", 400.0, 60.0, 10.0),
            bucket("Y2", 100.0, 80.0, 10.0),
        ]);
        emsrb(&mut leg);

        // Top class keeps the full cabin.
        assert_eq!(leg.buckets[0].alloc, 100.0);
        // Cheap class is limited by the protection for the expensive one.
        assert!(leg.buckets[1].alloc < 100.0);
        assert!(leg.buckets[1].alloc >= 0.0);
    }

    #[test]
    fn test_equal_fares_need_no_protection() {
        let mut leg = leg_with_buckets(vec![
            bucket("Y1", 300.0, 50.0, 5.0),
            bucket("Y2", 300.0, 50.0, 5.0),
        ]);
        emsrb(&mut leg);
        assert_eq!(leg.buckets[1].alloc, 100.0);
    }

    #[test]
    fn test_higher_cheap_fare_gets_more_seats() {
        let mut cheap = leg_with_buckets(vec![
            bucket("Y1", 400.0, 60.0, 10.0),
            bucket("Y2", 100.0, 80.0, 10.0),
        ]);
        let mut pricier = leg_with_buckets(vec![
            bucket("Y1", 400.0, 60.0, 10.0),
            bucket("Y2", 300.0, 80.0, 10.0),
        ]);
        emsrb(&mut cheap);
        emsrb(&mut pricier);
        assert!(pricier.buckets[1].alloc > cheap.buckets[1].alloc);
    }
}
