//! Demand generation
//!
//! Runs once per sample, before the event loop starts: pushes the DCP and
//! daily checkpoint events, then transforms each static market definition
//! into a stochastic demand level and hands the realized passenger count to
//! the engine's timeframe allocator.
//!
//! # Variance decomposition
//!
//! Demand noise is layered, PODS-style:
//! - one system-level deviate per sample, shared by every market
//! - one market-level deviate per `(orig, dest)` pair, shared by that
//!   market's segments (cached within the sample)
//! - one passenger-type deviate per demand record, drawn fresh every time —
//!   deliberately NOT cached across segments; correlation enters only at
//!   the system and market levels
//!
//! ```text
//! mu    = base * (1 + sys_rn*sys_k + mrn*mkt_k + trn*pax_k [+ urn])
//! sigma = sqrt(|mu| * z_factor)
//! scenario_demand = max(mu + sigma*normal(), 0)
//! ```
//!
//! The realized count is truncated (not rounded) to an integer passenger
//! count. The allocator must schedule exactly that many arrival events;
//! any mismatch is fatal on the spot.

use crate::config::SimulationControls;
use crate::core::time::dcp_event_time;
use crate::engine::{EventKind, SimulationEngine};
use crate::error::SimulationError;
use std::collections::HashMap;

/// Per-sample demand generator. Holds only the k-factor configuration;
/// all mutable state lives in the engine.
#[derive(Debug, Clone)]
pub struct DemandGenerator {
    sys_k_factor: f64,
    mkt_k_factor: f64,
    pax_type_k_factor: f64,
    tf_k_factor: f64,
    z_factor: f64,
    simple_k_factor: Option<f64>,
}

impl DemandGenerator {
    pub fn new(controls: &SimulationControls) -> Self {
        Self {
            sys_k_factor: controls.sys_k_factor,
            mkt_k_factor: controls.mkt_k_factor,
            pax_type_k_factor: controls.pax_type_k_factor,
            tf_k_factor: controls.tf_k_factor,
            z_factor: controls.z_factor,
            simple_k_factor: controls.simple_k_factor,
        }
    }

    /// Push one checkpoint event per non-zero DCP, plus a daily
    /// reoptimization event for every other day inside the horizon.
    /// DCP 0 is never pre-scheduled: it is reached implicitly when the
    /// queue drains.
    pub fn generate_dcp_rm_events(&self, engine: &mut SimulationEngine) {
        let base_time = engine.base_time();
        let dcp_hour = engine.dcp_hour();
        let dcps: Vec<u32> = engine.dcps().to_vec();

        for (dcp_index, &dcp) in dcps.iter().enumerate() {
            if dcp == 0 {
                continue;
            }
            let event_time = dcp_event_time(base_time, dcp, dcp_hour);
            engine.add_event(event_time, EventKind::Dcp { dcp, dcp_index });
        }

        let max_days_prior = dcps.iter().copied().max().unwrap_or(0);
        for days_prior in 0..max_days_prior {
            if dcps.contains(&days_prior) {
                continue;
            }
            let event_time = dcp_event_time(base_time, days_prior, dcp_hour);
            engine.add_event(event_time, EventKind::Daily { days_prior });
        }
    }

    /// Generate this sample's demand and fill the event queue.
    ///
    /// `system_rn` may be passed in explicitly for reproducible tests;
    /// normally it is drawn here, once, shared across all markets.
    /// Returns the total number of arrival events scheduled.
    pub fn generate_demands(
        &self,
        engine: &mut SimulationEngine,
        system_rn: Option<f64>,
    ) -> Result<usize, SimulationError> {
        self.generate_dcp_rm_events(engine);

        let mut total_events = 0usize;
        let system_rn = system_rn.unwrap_or_else(|| engine.rng_mut().get_normal());

        // One market-level deviate per (orig, dest), cached for the sample.
        let mut mrn_ref: HashMap<(String, String), f64> = HashMap::new();

        let end_time = engine.base_time();
        let past_burn = engine.past_burn();
        let num_demands = engine.demands().len();

        for idx in 0..num_demands {
            let (base, key, orig, dest, segment) = {
                let dmd = &engine.demands()[idx];
                (
                    dmd.base_demand,
                    (dmd.orig.clone(), dmd.dest.clone()),
                    dmd.orig.clone(),
                    dmd.dest.clone(),
                    dmd.segment.clone(),
                )
            };

            // Passenger-type deviate: fresh per demand record, by design.
            let trn = engine.rng_mut().get_normal();
            let mrn = match mrn_ref.get(&key) {
                Some(&cached) => cached,
                None => {
                    let drawn = engine.rng_mut().get_normal();
                    mrn_ref.insert(key, drawn);
                    drawn
                }
            };
            let urn = match self.simple_k_factor {
                Some(k) => engine.rng_mut().get_normal() * k,
                None => 0.0,
            };

            let mu = base
                * (1.0
                    + system_rn * self.sys_k_factor
                    + mrn * self.mkt_k_factor
                    + trn * self.pax_type_k_factor
                    + urn);
            let sigma = (mu.abs() * self.z_factor).sqrt();
            let n = mu + sigma * engine.rng_mut().get_normal();
            let scenario_demand = n.max(0.0);

            log::debug!(
                "DMD,{},{},{},{},{},{:.2},{:.2},{:.2}",
                engine.sample(),
                orig,
                dest,
                segment,
                base,
                mu,
                sigma,
                n
            );

            {
                let dmd = &mut engine.demands_mut()[idx];
                dmd.scenario_demand = scenario_demand;
                if past_burn {
                    dmd.gt_demand += scenario_demand;
                }
            }

            // Truncation, not rounding.
            let num_pax = scenario_demand as u32;
            let num_events =
                engine.allocate_demand_to_tf(idx, num_pax, self.tf_k_factor, end_time);
            total_events += num_events;

            if num_events as u32 != num_pax {
                return Err(SimulationError::AllocationMismatch {
                    orig,
                    dest,
                    segment,
                    trial: engine.trial(),
                    sample: engine.sample(),
                    num_pax,
                    num_events: num_events as u32,
                });
            }
        }

        Ok(total_events)
    }
}
