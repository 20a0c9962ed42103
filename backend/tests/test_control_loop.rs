//! Control loop integration
//!
//! Capacity doubling at the burn-in boundaries, persistence cadence
//! (per-DCP details vs trial finals, commit batching), and the reporting
//! guard on the burn period.

use rm_simulator_core_rs::{
    MemorySink, ScenarioConfig, Simulation, SimulationError, SinkSettings,
};

fn scenario(controls: serde_json::Value) -> ScenarioConfig {
    serde_json::from_value(serde_json::json!({
        "scenario": "control-loop-test",
        "simulation_controls": controls,
        "classes": ["Y1"],
        "dcps": [21, 7, 0],
        "booking_curves": {
            "leisure": {"curve": {"21": 0.3, "7": 0.8}}
        },
        "legs": [
            {"carrier": "AL1", "fltno": 101, "orig": "BOS", "dest": "ORD",
             "capacity": 50, "distance": 860}
        ],
        "demands": [
            {"orig": "BOS", "dest": "ORD", "segment": "leisure",
             "base_demand": 40.0, "reference_fare": 200.0}
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
fn test_capacity_restored_at_the_doubling_boundary() {
    let config = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 6,
        "burn_samples": 2,
        "random_seed": 42,
        "double_capacity_until": 2
    }));
    let mut sim = Simulation::without_sink(config).unwrap();
    sim.run().unwrap();

    // Doubled at sample 0, halved back at sample 2: net unchanged.
    assert_eq!(sim.engine().legs()[0].capacity, 50.0);
}

#[test]
fn test_capacity_stays_doubled_when_boundary_is_never_reached() {
    let config = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 4,
        "burn_samples": 1,
        "random_seed": 42,
        "double_capacity_until": 100
    }));
    let mut sim = Simulation::without_sink(config).unwrap();
    sim.run().unwrap();

    assert_eq!(sim.engine().legs()[0].capacity, 100.0);
}

#[test]
fn test_capacity_untouched_without_the_setting() {
    let config = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 4,
        "burn_samples": 1,
        "random_seed": 42
    }));
    let mut sim = Simulation::without_sink(config).unwrap();
    sim.run().unwrap();

    assert_eq!(sim.engine().legs()[0].capacity, 50.0);
}

#[test]
fn test_detail_rows_every_dcp_and_finals_every_trial() {
    let mut config = scenario(serde_json::json!({
        "num_trials": 2,
        "num_samples": 3,
        "burn_samples": 1,
        "random_seed": 7
    }));
    config.db = SinkSettings {
        filename: None,
        commit_count_delay: None,
        write_items: ["leg", "leg_final"].iter().map(|s| s.to_string()).collect(),
    };

    let sink = MemorySink::new(&config.db);
    let mut sim = Simulation::new(config, Box::new(sink)).unwrap();
    sim.run().unwrap();

    let sink = sim
        .sink()
        .as_any()
        .downcast_ref::<MemorySink>()
        .expect("memory sink");

    // 3 checkpoints per sample (DCPs 21 and 7 plus the implicit day 0),
    // 3 samples, 2 trials, 1 leg.
    assert_eq!(sink.rows_for("leg"), 3 * 3 * 2);
    // One final snapshot per trial.
    assert_eq!(sink.rows_for("leg_final"), 2);
    // One commit per sample plus one after each trial final.
    assert_eq!(sink.commits, (3 + 1) * 2);
}

#[test]
fn test_burn_period_must_leave_samples() {
    let config = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 5,
        "burn_samples": 5,
        "random_seed": 42
    }));
    let mut sim = Simulation::without_sink(config).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimulationError::InsufficientSamples { .. }));
}

#[test]
fn test_burned_samples_do_not_count_toward_grand_totals() {
    let few_burn = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 6,
        "burn_samples": 1,
        "random_seed": 42
    }));
    let many_burn = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 6,
        "burn_samples": 5,
        "random_seed": 42
    }));

    let mut sim_few = Simulation::without_sink(few_burn).unwrap();
    let summary_few = sim_few.run().unwrap();
    let mut sim_many = Simulation::without_sink(many_burn).unwrap();
    let summary_many = sim_many.run().unwrap();

    // Same seeded samples; the wider burn window counts fewer of them.
    assert!(summary_few.demands[0].gt_demand > summary_many.demands[0].gt_demand);
}

#[test]
fn test_sample_done_callback_sees_every_sample() {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    let config = scenario(serde_json::json!({
        "num_trials": 2,
        "num_samples": 3,
        "burn_samples": 1,
        "random_seed": 42
    }));
    let mut sim = Simulation::without_sink(config).unwrap();

    let count = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&count);
    sim.set_sample_done_callback(Box::new(move |done, total| {
        seen.store(done, Ordering::SeqCst);
        assert!(done <= total);
    }));
    sim.run().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2 * 3);
}

#[test]
fn test_summary_tables_have_expected_shape() {
    let config = scenario(serde_json::json!({
        "num_trials": 1,
        "num_samples": 6,
        "burn_samples": 2,
        "random_seed": 42
    }));
    let mut sim = Simulation::without_sink(config).unwrap();
    let summary = sim.run().unwrap();

    assert_eq!(summary.demands.len(), 1);
    assert_eq!(summary.fares.len(), 1);
    assert_eq!(summary.legs.len(), 1);
    assert_eq!(summary.paths.len(), 1);
    assert_eq!(summary.carriers.len(), 1);
    // Timeframe rows cover every non-zero DCP.
    assert_eq!(summary.bookings_by_timeframe.len(), 2);

    let carrier = &summary.carriers[0];
    assert_eq!(carrier.carrier, "AL1");
    assert!(carrier.avg_sold > 0.0, "someone should have booked");
    assert!(carrier.sys_lf > 0.0 && carrier.sys_lf <= 100.0);
    assert!(carrier.avg_price > 0.0);

    // Demand flowed through to the leg.
    assert!(summary.legs[0].avg_sold > 0.0);
    assert!(summary.legs[0].lf <= 100.0);
}
