//! Simulation engine
//!
//! Owns the entity object graph (legs, demands, fares, paths, airlines,
//! booking curves), the deterministic random stream, and the discrete event
//! queue for the sample in progress. The control loop talks to the engine
//! through a small verb set: `add_*` constructors, `allocate_demand_to_tf`,
//! `go()`, `num_events()` and the per-entity counters.
//!
//! # Event loop contract
//!
//! `go()` consumes passenger-arrival events internally (booking them
//! against fares and buckets) and surfaces only control events: DCP
//! checkpoints, daily checkpoints, and the terminal `Done` sentinel once
//! the queue has drained. `num_events()` is 0 immediately after `Done`.

mod allocate;
mod booking;
mod events;

pub use events::{EngineEvent, EventKind, EventQueue};

use crate::models::{Airline, BookingCurve, Demand, Fare, Leg, Path};
use crate::rng::RandomStream;
use std::collections::{BTreeMap, HashMap};

/// The native object graph plus the event queue for one simulation.
pub struct SimulationEngine {
    name: String,

    legs: Vec<Leg>,
    demands: Vec<Demand>,
    fares: Vec<Fare>,
    paths: Vec<Path>,
    airlines: Vec<Airline>,
    curves: BTreeMap<String, BookingCurve>,

    /// `(orig, dest)` → path indices, built by `build_connections`.
    path_index: HashMap<(String, String), Vec<usize>>,

    /// Airline name → index, for counter updates during booking.
    airline_index: HashMap<String, usize>,

    /// Data collection points, strictly decreasing, ending at 0.
    dcp_list: Vec<u32>,

    /// Departure instant of the sample in progress (epoch seconds).
    base_time: i64,
    dcp_hour: u32,

    trial: u64,
    sample: u64,
    burn_samples: u64,

    /// Most recent DCP reached (days prior).
    pub last_dcp: u32,

    rng: RandomStream,
    queue: EventQueue,
}

impl SimulationEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legs: Vec::new(),
            demands: Vec::new(),
            fares: Vec::new(),
            paths: Vec::new(),
            airlines: Vec::new(),
            curves: BTreeMap::new(),
            path_index: HashMap::new(),
            airline_index: HashMap::new(),
            dcp_list: Vec::new(),
            base_time: 0,
            dcp_hour: 0,
            trial: 0,
            sample: 0,
            burn_samples: 0,
            last_dcp: 0,
            rng: RandomStream::new(42),
            queue: EventQueue::new(),
        }
    }

    // ========================================================================
    // Graph construction
    // ========================================================================

    pub fn add_leg(&mut self, leg: Leg) {
        self.legs.push(leg);
    }

    pub fn add_demand(&mut self, demand: Demand) {
        self.demands.push(demand);
    }

    pub fn add_fare(&mut self, fare: Fare) {
        self.fares.push(fare);
    }

    pub fn add_path(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn add_airline(&mut self, airline: Airline) {
        self.airline_index
            .insert(airline.name.clone(), self.airlines.len());
        self.airlines.push(airline);
    }

    pub fn add_curve(&mut self, curve: BookingCurve) {
        self.curves.insert(curve.name().to_string(), curve);
    }

    /// Index paths by market. Returns the number of connected paths.
    pub fn build_connections(&mut self) -> usize {
        self.path_index.clear();
        for (idx, path) in self.paths.iter().enumerate() {
            self.path_index
                .entry((path.orig.clone(), path.dest.clone()))
                .or_default()
                .push(idx);
        }
        self.paths.len()
    }

    /// Link fares to demands (matching market, cheapest first) and to legs
    /// (matching carrier and market → bucket decision fares).
    pub fn link_fares(&mut self) {
        for dmd in &mut self.demands {
            let mut indices: Vec<usize> = self
                .fares
                .iter()
                .enumerate()
                .filter(|(_, f)| f.orig == dmd.orig && f.dest == dmd.dest)
                .map(|(i, _)| i)
                .collect();
            indices.sort_by(|&a, &b| {
                self.fares[a]
                    .price
                    .partial_cmp(&self.fares[b].price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            dmd.fare_indices = indices;
        }

        for leg in &mut self.legs {
            for fare in &self.fares {
                if fare.carrier == leg.carrier && fare.orig == leg.orig && fare.dest == leg.dest {
                    leg.set_bucket_decision_fare(&fare.booking_class, fare.price);
                }
            }
        }
    }

    // ========================================================================
    // Run parameters
    // ========================================================================

    pub fn set_dcps(&mut self, dcps: Vec<u32>) {
        self.dcp_list = dcps;
    }

    pub fn dcps(&self) -> &[u32] {
        &self.dcp_list
    }

    pub fn num_timeframes(&self) -> usize {
        self.dcp_list.len()
    }

    pub fn set_base_time(&mut self, base_time: i64) {
        self.base_time = base_time;
    }

    pub fn base_time(&self) -> i64 {
        self.base_time
    }

    pub fn set_dcp_hour(&mut self, dcp_hour: u32) {
        self.dcp_hour = dcp_hour;
    }

    pub fn dcp_hour(&self) -> u32 {
        self.dcp_hour
    }

    pub fn set_burn_samples(&mut self, burn_samples: u64) {
        self.burn_samples = burn_samples;
    }

    pub fn burn_samples(&self) -> u64 {
        self.burn_samples
    }

    pub fn set_trial(&mut self, trial: u64) {
        self.trial = trial;
    }

    pub fn trial(&self) -> u64 {
        self.trial
    }

    pub fn set_sample(&mut self, sample: u64) {
        self.sample = sample;
    }

    pub fn sample(&self) -> u64 {
        self.sample
    }

    /// Whether the sample in progress counts toward reported results.
    pub fn past_burn(&self) -> bool {
        self.sample >= self.burn_samples
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Random stream
    // ========================================================================

    pub fn rng_mut(&mut self) -> &mut RandomStream {
        &mut self.rng
    }

    /// Deterministically reseed the stream (see `RandomStream::reseed`).
    pub fn reseed(&mut self, parts: &[u64]) {
        self.rng.reseed(parts);
    }

    // ========================================================================
    // Entity access
    // ========================================================================

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn legs_mut(&mut self) -> &mut [Leg] {
        &mut self.legs
    }

    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    pub fn demands_mut(&mut self) -> &mut [Demand] {
        &mut self.demands
    }

    pub fn fares(&self) -> &[Fare] {
        &self.fares
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn paths_mut(&mut self) -> &mut [Path] {
        &mut self.paths
    }

    pub fn airlines(&self) -> &[Airline] {
        &self.airlines
    }

    pub fn curves(&self) -> &BTreeMap<String, BookingCurve> {
        &self.curves
    }

    // ========================================================================
    // Event queue
    // ========================================================================

    pub fn add_event(&mut self, time: i64, kind: EventKind) {
        self.queue.push(time, kind);
    }

    pub fn num_events(&self) -> usize {
        self.queue.len()
    }

    /// Advance the event loop. Passenger arrivals are booked internally;
    /// DCP/daily checkpoints are returned to the caller; `Done` signals
    /// the queue has drained.
    pub fn go(&mut self) -> EngineEvent {
        loop {
            match self.queue.pop() {
                None => return EngineEvent::Done,
                Some((time, EventKind::Arrival { demand_idx, tf_index })) => {
                    self.book_passenger(demand_idx, tf_index, time);
                }
                Some((_, EventKind::Dcp { dcp, dcp_index })) => {
                    return EngineEvent::Dcp { dcp, dcp_index };
                }
                Some((_, EventKind::Daily { days_prior })) => {
                    return EngineEvent::Daily { days_prior };
                }
            }
        }
    }

    // ========================================================================
    // Snapshots and counter resets
    // ========================================================================

    /// Snapshot per-leg and per-path cumulative sales at a DCP boundary.
    pub fn capture_dcp(&mut self, dcp_index: usize) {
        for leg in &mut self.legs {
            leg.capture_dcp(dcp_index);
        }
        for path in &mut self.paths {
            path.capture_dcp(dcp_index);
        }
    }

    /// Start a fresh sample: archive the finished departure into bucket
    /// history and clear per-sample counters. Grand totals persist.
    pub fn reset_counters(&mut self) {
        let num_tf = self.num_timeframes();
        for leg in &mut self.legs {
            leg.reset_sample(num_tf);
        }
        for path in &mut self.paths {
            path.reset_sample(num_tf);
        }
        for dmd in &mut self.demands {
            dmd.reset_sample(num_tf);
        }
        for fare in &mut self.fares {
            fare.reset_sample();
        }
        for airline in &mut self.airlines {
            airline.reset_sample();
        }
        self.queue.clear();
    }

    /// Start a fresh trial: clear per-sample state and the learning state
    /// (bucket history, forecasts). Grand totals span the whole run so
    /// reporting can divide by `num_trials * (num_samples - burn_samples)`.
    pub fn reset_trial_counters(&mut self) {
        let num_tf = self.num_timeframes();
        for leg in &mut self.legs {
            leg.reset_history(num_tf);
        }
        for path in &mut self.paths {
            path.reset_sample(num_tf);
        }
        for dmd in &mut self.demands {
            dmd.reset_sample(num_tf);
        }
        for fare in &mut self.fares {
            fare.reset_sample();
        }
        for airline in &mut self.airlines {
            airline.reset_sample();
        }
        self.queue.clear();
    }
}
