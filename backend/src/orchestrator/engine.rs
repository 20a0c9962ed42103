//! Simulation control loop
//!
//! Drives the trial/sample state machine over the engine:
//!
//! ```text
//! For each trial t:
//!   reset learning state (bucket history, forecasts)
//!   For each sample s:
//!     1. Apply capacity doubling at the burn-in boundaries
//!     2. Reseed the random stream from (global_seed, t, s)
//!     3. Reset per-sample counters (skipped for the very first sample)
//!     4. Generate demand -> arrival + DCP events in the queue
//!     5. Run the event loop to Done; at each DCP: capture snapshots,
//!        run every airline's RM pipeline, persist details
//!     6. Commit persisted writes
//!   Persist the trial-final snapshot
//! Terminal: compute summary report tables
//! ```
//!
//! # Determinism
//!
//! All randomness flows through the engine's seeded stream. With a
//! configured `random_seed`, any `(trial, sample)` replays bit-identically
//! regardless of what ran before it.

use crate::arrivals::DemandGenerator;
use crate::config::ScenarioConfig;
use crate::engine::{EngineEvent, SimulationEngine};
use crate::error::{ConfigError, SimulationError};
use crate::models::{Airline, Bucket, Demand, Fare, Leg, Path};
use crate::orchestrator::accum::TimeframeAccumulators;
use crate::rm::{RmSystem, StepRegistry, DAILY_PROCESS, DCP_PROCESS};
use crate::store::{DetailSink, NullSink, RunMetadata};
use crate::summary::SummaryTables;
use std::collections::{BTreeMap, HashMap};

/// Progress hook, called after every completed sample with
/// `(samples_done, samples_total)`.
pub type SampleDoneCallback = Box<dyn FnMut(u64, u64) + Send>;

/// One simulation run: validated configuration, engine object graph,
/// RM systems, persistence sink, and accumulators.
pub struct Simulation {
    config: ScenarioConfig,
    engine: SimulationEngine,
    rm_systems: BTreeMap<String, RmSystem>,
    generator: DemandGenerator,
    sink: Box<dyn DetailSink>,
    accum: TimeframeAccumulators,
    metadata: RunMetadata,
    sample_done_callback: Option<SampleDoneCallback>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("rm_systems", &self.rm_systems)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build a simulation with the built-in RM step registry.
    pub fn new(config: ScenarioConfig, sink: Box<dyn DetailSink>) -> Result<Self, ConfigError> {
        Self::with_registry(config, sink, &StepRegistry::with_builtins())
    }

    /// Build a simulation without persistence.
    pub fn without_sink(config: ScenarioConfig) -> Result<Self, ConfigError> {
        Self::new(config, Box::new(NullSink))
    }

    /// Build a simulation with a caller-supplied step registry (for
    /// registered user steps). Validates the whole configuration first.
    pub fn with_registry(
        config: ScenarioConfig,
        sink: Box<dyn DetailSink>,
        registry: &StepRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate(registry)?;

        let controls = &config.simulation_controls;
        let mut engine = SimulationEngine::new(&config.scenario);
        engine.set_dcps(config.dcps.clone());
        engine.set_base_time(controls.base_time);
        engine.set_dcp_hour(controls.dcp_hour);
        engine.set_burn_samples(controls.burn_samples);

        for (name, curve_config) in &config.booking_curves {
            engine.add_curve(crate::config::build_curve(name, curve_config));
        }

        let mut rm_systems = BTreeMap::new();
        for (name, system_config) in &config.rm_systems {
            rm_systems.insert(
                name.clone(),
                RmSystem::build(name, system_config, registry)?,
            );
        }

        for (name, airline_config) in &config.airlines {
            engine.add_airline(Airline::new(name, &airline_config.rm_system));
        }

        let mut leg_index_by_fltno = HashMap::new();
        for leg_config in &config.legs {
            let mut leg = Leg::new(
                &leg_config.carrier,
                leg_config.fltno,
                &leg_config.orig,
                &leg_config.dest,
                leg_config.capacity,
            );
            leg.dep_time = leg_config.dep_time;
            leg.distance = leg_config.distance;
            for class in &config.classes {
                leg.add_bucket(Bucket::new(class, leg_config.capacity));
            }
            leg_index_by_fltno.insert(leg_config.fltno, engine.legs().len());
            engine.add_leg(leg);
        }

        for dmd_config in &config.demands {
            let mut dmd = Demand::new(&dmd_config.orig, &dmd_config.dest, &dmd_config.segment);
            dmd.base_demand = dmd_config.base_demand * controls.demand_multiplier;
            dmd.reference_fare = dmd_config.reference_fare;
            dmd.business =
                dmd_config.choice_model() == "business" || dmd_config.segment == "business";
            dmd.curve = Some(dmd_config.resolved_curve().to_string());
            engine.add_demand(dmd);
        }

        for fare_config in &config.fares {
            let mut fare = Fare::new(
                &fare_config.carrier,
                &fare_config.orig,
                &fare_config.dest,
                &fare_config.booking_class,
                fare_config.price,
            );
            fare.adv_purch = fare_config.advance_purchase;
            engine.add_fare(fare);
        }

        for path_config in &config.paths {
            let mut path = Path::new(&path_config.orig, &path_config.dest);
            path.path_quality_index = path_config.path_quality_index;
            for fltno in &path_config.legs {
                // Validated above: every referenced leg exists.
                path.add_leg(leg_index_by_fltno[fltno]);
            }
            engine.add_path(path);
        }

        let num_paths = engine.build_connections();
        log::debug!("connections done, num_paths = {}", num_paths);
        engine.link_fares();

        // Size per-sample vectors; the first sample skips reset_counters.
        engine.reset_counters();

        let metadata = RunMetadata::for_config(&config);
        let generator = DemandGenerator::new(controls);

        Ok(Self {
            config,
            engine,
            rm_systems,
            generator,
            sink,
            accum: TimeframeAccumulators::new(),
            metadata,
            sample_done_callback: None,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine {
        &mut self.engine
    }

    pub fn accumulators(&self) -> &TimeframeAccumulators {
        &self.accum
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn sink(&self) -> &dyn DetailSink {
        self.sink.as_ref()
    }

    pub fn set_sample_done_callback(&mut self, callback: SampleDoneCallback) {
        self.sample_done_callback = Some(callback);
    }

    /// Deterministically reseed the engine's random stream.
    pub fn reseed(&mut self, parts: &[u64]) {
        self.engine.reseed(parts);
    }

    /// Run one sample's demand generation (mostly useful in tests; the
    /// control loop calls this itself).
    pub fn generate_demands(&mut self, system_rn: Option<f64>) -> Result<usize, SimulationError> {
        self.generator.generate_demands(&mut self.engine, system_rn)
    }

    // ========================================================================
    // Control loop
    // ========================================================================

    /// Run every configured trial and compute the end-of-run summary.
    pub fn run(&mut self) -> Result<SummaryTables, SimulationError> {
        let controls = &self.config.simulation_controls;
        let num_trials = controls.num_trials;
        let num_samples = controls.num_samples;
        let burn_samples = controls.burn_samples;
        if num_samples <= burn_samples {
            return Err(SimulationError::InsufficientSamples {
                num_trials,
                num_samples,
                burn_samples,
            });
        }

        log::debug!(
            "run_sim, num_trials = {}, num_samples = {}",
            num_trials,
            num_samples
        );

        let samples_total = num_trials * num_samples;
        let mut samples_done = 0;
        for trial in 0..num_trials {
            self.run_trial(trial, &mut samples_done, samples_total)?;
        }

        let num_samples_eff = num_trials * (num_samples - burn_samples);
        Ok(self.compute_reports(num_samples_eff))
    }

    /// Run exactly one trial (used by the per-trial worker pool) and
    /// compute a summary over that trial alone.
    pub fn run_single_trial(&mut self, trial: u64) -> Result<SummaryTables, SimulationError> {
        let controls = &self.config.simulation_controls;
        let num_samples = controls.num_samples;
        let burn_samples = controls.burn_samples;
        if num_samples <= burn_samples {
            return Err(SimulationError::InsufficientSamples {
                num_trials: 1,
                num_samples,
                burn_samples,
            });
        }

        let mut samples_done = 0;
        self.run_trial(trial, &mut samples_done, num_samples)?;
        Ok(self.compute_reports(num_samples - burn_samples))
    }

    fn run_trial(
        &mut self,
        trial: u64,
        samples_done: &mut u64,
        samples_total: u64,
    ) -> Result<(), SimulationError> {
        let controls = self.config.simulation_controls.clone();

        self.engine.set_trial(trial);
        self.engine.reset_trial_counters();
        self.accum.reset();

        for sample in 0..controls.num_samples {
            if let Some(until) = controls.double_capacity_until {
                // Extra seats during burn-in, restored exactly once.
                if sample == 0 {
                    for leg in self.engine.legs_mut() {
                        leg.capacity *= 2.0;
                    }
                } else if sample == until {
                    for leg in self.engine.legs_mut() {
                        leg.capacity /= 2.0;
                    }
                }
            }

            self.engine.set_sample(sample);
            if let Some(seed) = controls.random_seed {
                self.engine.reseed(&[seed, trial, sample]);
            }

            if let Some(freq) = controls.update_frequency {
                if freq > 0 && sample % freq == 0 {
                    self.log_progress(trial, sample);
                }
            }

            if trial > 0 || sample > 0 {
                self.engine.reset_counters();
            }

            self.generator.generate_demands(&mut self.engine, None)?;

            // Event loop: arrivals are consumed inside the engine; DCP and
            // daily checkpoints surface here.
            loop {
                match self.engine.go() {
                    EngineEvent::Dcp { dcp, dcp_index } => {
                        self.run_airline_models(dcp, dcp_index, trial, sample)?;
                    }
                    EngineEvent::Daily { days_prior } => {
                        self.run_daily_models(days_prior, trial, sample)?;
                    }
                    EngineEvent::Done => {
                        // Done is the implicit DCP 0 checkpoint.
                        let last_index = self.engine.dcps().len() - 1;
                        self.run_airline_models(0, last_index, trial, sample)?;
                        let remaining = self.engine.num_events();
                        if remaining != 0 {
                            return Err(SimulationError::EventQueueNotEmpty {
                                trial,
                                sample,
                                remaining,
                            });
                        }
                        break;
                    }
                }
            }

            self.sink.commit();
            *samples_done += 1;
            if let Some(callback) = &mut self.sample_done_callback {
                callback(*samples_done, samples_total);
            }
        }

        self.sink.save_final(&self.engine);
        self.sink.commit();
        Ok(())
    }

    /// DCP checkpoint: snapshot leg/path state, run every airline's RM
    /// pipeline, persist details, fold fare sales into the accumulators.
    fn run_airline_models(
        &mut self,
        dcp: u32,
        dcp_index: usize,
        trial: u64,
        sample: u64,
    ) -> Result<(), SimulationError> {
        self.engine.last_dcp = dcp;
        self.engine.capture_dcp(dcp_index);

        let airlines: Vec<(String, String)> = self
            .engine
            .airlines()
            .iter()
            .map(|a| (a.name.clone(), a.rm_system.clone()))
            .collect();

        for (airline, rm_name) in airlines {
            if let Some(system) = self.rm_systems.get_mut(&rm_name) {
                system
                    .run_process(DCP_PROCESS, &mut self.engine, &airline, dcp_index, dcp)
                    .map_err(|source| SimulationError::RmStepFailed {
                        airline: airline.clone(),
                        dcp,
                        trial,
                        sample,
                        source,
                    })?;
            }
        }

        self.sink.save_details(&self.engine, dcp);
        self.accum.accumulate(&self.engine, dcp_index);
        Ok(())
    }

    /// Daily checkpoint between DCPs: only airlines whose RM system has a
    /// "daily" process do any work.
    fn run_daily_models(
        &mut self,
        days_prior: u32,
        trial: u64,
        sample: u64,
    ) -> Result<(), SimulationError> {
        // History available: the number of DCPs already passed.
        let dcp_index = self
            .engine
            .dcps()
            .iter()
            .filter(|&&d| d > days_prior)
            .count();

        let airlines: Vec<(String, String)> = self
            .engine
            .airlines()
            .iter()
            .map(|a| (a.name.clone(), a.rm_system.clone()))
            .collect();

        for (airline, rm_name) in airlines {
            let Some(system) = self.rm_systems.get_mut(&rm_name) else {
                continue;
            };
            if !system.has_process(DAILY_PROCESS) {
                continue;
            }
            system
                .run_process(DAILY_PROCESS, &mut self.engine, &airline, dcp_index, days_prior)
                .map_err(|source| SimulationError::RmStepFailed {
                    airline: airline.clone(),
                    dcp: days_prior,
                    trial,
                    sample,
                    source,
                })?;
        }
        Ok(())
    }

    fn log_progress(&self, trial: u64, sample: u64) {
        let mut airline_info = String::new();
        for cxr in self.engine.airlines() {
            airline_info.push_str(&format!(", {}=${:8.0}", cxr.name, cxr.revenue));
        }
        let (mut dmd_b, mut dmd_l) = (0.0, 0.0);
        for dmd in self.engine.demands() {
            if dmd.business {
                dmd_b += dmd.scenario_demand;
            } else {
                dmd_l += dmd.scenario_demand;
            }
        }
        log::info!(
            "Trial={}, Sample={}{}, {}, {}",
            trial,
            sample,
            airline_info,
            dmd_b as i64,
            dmd_l as i64
        );
    }
}
