//! Per-trial worker pool
//!
//! Trials are statistically independent, so a multi-trial study can run
//! them concurrently: one worker per trial, each with its own engine,
//! random stream and sink. Nothing is shared; the parent just collects the
//! per-trial summary tables in trial order.
//!
//! Determinism is unaffected: each worker reseeds from
//! `(global_seed, trial, sample)`, so trial 3 produces the same numbers
//! whether it ran alone, sequentially, or in parallel.

use crate::config::ScenarioConfig;
use crate::error::SimulationError;
use crate::orchestrator::Simulation;
use crate::store::DetailSink;
use crate::summary::SummaryTables;

/// Run every configured trial in its own worker, returning one summary per
/// trial, in trial order.
///
/// `make_sink` is called once per trial to create that worker's private
/// sink (e.g. one output file per trial).
pub fn run_trials_parallel<F>(
    config: &ScenarioConfig,
    make_sink: F,
) -> Result<Vec<SummaryTables>, SimulationError>
where
    F: Fn(u64) -> Box<dyn DetailSink> + Sync,
{
    let num_trials = config.simulation_controls.num_trials;

    std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(num_trials as usize);
        for trial in 0..num_trials {
            let config = config.clone();
            let make_sink = &make_sink;
            handles.push(scope.spawn(move || -> Result<SummaryTables, SimulationError> {
                let sink = make_sink(trial);
                let mut sim = Simulation::new(config, sink)?;
                sim.run_single_trial(trial)
            }));
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let summary = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
            summaries.push(summary);
        }
        Ok(summaries)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NullSink;

    fn two_trial_config() -> ScenarioConfig {
        serde_json::from_value(serde_json::json!({
            "scenario": "parallel-test",
            "simulation_controls": {
                "num_trials": 2,
                "num_samples": 6,
                "burn_samples": 2,
                "random_seed": 42
            },
            "classes": ["Y1"],
            "dcps": [63, 35, 7, 0],
            "booking_curves": {
                "leisure": {"curve": {"63": 0.2, "35": 0.5, "7": 0.9}}
            },
            "legs": [
                {"carrier": "AL1", "fltno": 101, "orig": "BOS", "dest": "ORD",
                 "capacity": 120, "distance": 860}
            ],
            "demands": [
                {"orig": "BOS", "dest": "ORD", "segment": "leisure",
                 "base_demand": 60.0, "reference_fare": 200.0}
            ],
            "fares": [
                {"carrier": "AL1", "orig": "BOS", "dest": "ORD",
                 "booking_class": "Y1", "price": 200.0}
            ],
            "paths": [{"orig": "BOS", "dest": "ORD", "legs": [101]}],
            "airlines": {"AL1": {"rm_system": "fcfs"}},
            "rm_systems": {"fcfs": {"processes": {"dcp": []}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_parallel_returns_one_summary_per_trial() {
        let config = two_trial_config();
        let summaries = run_trials_parallel(&config, |_| Box::new(NullSink)).unwrap();
        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn test_parallel_trial_matches_sequential_trial() {
        let config = two_trial_config();

        let parallel = run_trials_parallel(&config, |_| Box::new(NullSink)).unwrap();

        // Trial 1 run on its own must produce the same numbers.
        let mut solo = Simulation::without_sink(config).unwrap();
        let solo_summary = solo.run_single_trial(1).unwrap();

        assert_eq!(
            parallel[1].carriers[0].avg_sold,
            solo_summary.carriers[0].avg_sold
        );
        assert_eq!(
            parallel[1].demands[0].gt_demand,
            solo_summary.demands[0].gt_demand
        );
    }
}
