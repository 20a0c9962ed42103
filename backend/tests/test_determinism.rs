//! Determinism guarantees
//!
//! For a fixed `(global_seed, trial, sample)` tuple, demand generation must
//! produce bit-identical realized demand and identical scheduled-event
//! counts — no matter how many other samples ran before it in the same
//! trial. This is what makes any single sample independently replayable.

use rm_simulator_core_rs::{ScenarioConfig, Simulation};

/// The end-to-end network from the spec's regression scenario: two legs,
/// one segment, a single airline, base demand 100, documented default
/// k-factors, global seed 42.
fn two_leg_scenario() -> ScenarioConfig {
    serde_json::from_value(serde_json::json!({
        "scenario": "regression",
        "simulation_controls": {
            "num_trials": 1,
            "num_samples": 10,
            "burn_samples": 2,
            "random_seed": 42
        },
        "classes": ["Y1", "Y2"],
        "dcps": [63, 56, 49, 42, 35, 31, 28, 24, 21, 17, 14, 10, 7, 5, 3, 1, 0],
        "booking_curves": {
            "leisure": {"curve": {
                "63": 0.06, "56": 0.11, "49": 0.15, "42": 0.22, "35": 0.30,
                "31": 0.35, "28": 0.40, "24": 0.46, "21": 0.52, "17": 0.60,
                "14": 0.68, "10": 0.76, "7": 0.83, "5": 0.89, "3": 0.94, "1": 0.99
            }}
        },
        "legs": [
            {"carrier": "AL1", "fltno": 101, "orig": "BOS", "dest": "ORD",
             "capacity": 120, "distance": 860},
            {"carrier": "AL1", "fltno": 102, "orig": "ORD", "dest": "LAX",
             "capacity": 120, "distance": 1740}
        ],
        "demands": [
            {"orig": "BOS", "dest": "ORD", "segment": "leisure",
             "base_demand": 100.0, "reference_fare": 250.0},
            {"orig": "BOS", "dest": "LAX", "segment": "leisure",
             "base_demand": 100.0, "reference_fare": 400.0}
        ],
        "fares": [
            {"carrier": "AL1", "orig": "BOS", "dest": "ORD",
             "booking_class": "Y1", "price": 300.0},
            {"carrier": "AL1", "orig": "BOS", "dest": "ORD",
             "booking_class": "Y2", "price": 150.0},
            {"carrier": "AL1", "orig": "BOS", "dest": "LAX",
             "booking_class": "Y1", "price": 500.0},
            {"carrier": "AL1", "orig": "BOS", "dest": "LAX",
             "booking_class": "Y2", "price": 320.0}
        ],
        "paths": [
            {"orig": "BOS", "dest": "ORD", "legs": [101]},
            {"orig": "BOS", "dest": "LAX", "legs": [101, 102]}
        ],
        "airlines": {"AL1": {"rm_system": "standard"}},
        "rm_systems": {
            "standard": {"processes": {"dcp": [
                {"step_type": "untruncation"},
                {"step_type": "forecast"},
                {"step_type": "optimization"}
            ]}}
        }
    }))
    .unwrap()
}

/// Generate one sample's demand under a given (trial, sample) reseed and
/// return the realized demand levels plus the scheduled event count.
fn demand_fingerprint(sim: &mut Simulation, trial: u64, sample: u64) -> (Vec<f64>, usize) {
    sim.engine_mut().set_trial(trial);
    sim.engine_mut().set_sample(sample);
    sim.engine_mut().reset_counters();
    sim.reseed(&[42, trial, sample]);
    let events = sim.generate_demands(None).unwrap();
    let demands = sim
        .engine()
        .demands()
        .iter()
        .map(|d| d.scenario_demand)
        .collect();
    (demands, events)
}

#[test]
fn test_same_tuple_is_bit_identical_across_instances() {
    let mut sim1 = Simulation::without_sink(two_leg_scenario()).unwrap();
    let mut sim2 = Simulation::without_sink(two_leg_scenario()).unwrap();

    let fp1 = demand_fingerprint(&mut sim1, 0, 0);
    let fp2 = demand_fingerprint(&mut sim2, 0, 0);

    assert_eq!(fp1, fp2);
    assert!(fp1.0.iter().all(|&d| d >= 0.0));
}

#[test]
fn test_replay_is_independent_of_preceding_samples() {
    // Instance 1: go straight to (trial 2, sample 234).
    let mut direct = Simulation::without_sink(two_leg_scenario()).unwrap();
    let target_direct = demand_fingerprint(&mut direct, 2, 234);

    // Instance 2: burn through unrelated samples first.
    let mut wandering = Simulation::without_sink(two_leg_scenario()).unwrap();
    for sample in 0..7 {
        demand_fingerprint(&mut wandering, 1, sample);
    }
    let target_replayed = demand_fingerprint(&mut wandering, 2, 234);

    assert_eq!(target_direct, target_replayed);
}

#[test]
fn test_different_samples_differ() {
    let mut sim = Simulation::without_sink(two_leg_scenario()).unwrap();
    let a = demand_fingerprint(&mut sim, 0, 0);
    let b = demand_fingerprint(&mut sim, 0, 1);
    assert_ne!(a.0, b.0);
}

#[test]
fn test_full_run_is_reproducible() {
    let summary1 = Simulation::without_sink(two_leg_scenario())
        .unwrap()
        .run()
        .unwrap();
    let summary2 = Simulation::without_sink(two_leg_scenario())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        summary1.carriers[0].avg_rev,
        summary2.carriers[0].avg_rev
    );
    assert_eq!(summary1.demands[0].gt_demand, summary2.demands[0].gt_demand);
    assert_eq!(summary1.legs[0].avg_sold, summary2.legs[0].avg_sold);
}

#[test]
fn test_unseeded_stream_is_internally_consistent() {
    // Without a global seed the run still completes; results just aren't
    // pinned across runs.
    let mut config = two_leg_scenario();
    config.simulation_controls.random_seed = None;
    let mut sim = Simulation::without_sink(config).unwrap();
    let summary = sim.run().unwrap();
    assert_eq!(summary.carriers.len(), 1);
}
