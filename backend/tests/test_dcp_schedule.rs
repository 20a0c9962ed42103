//! DCP event schedule
//!
//! One pre-scheduled event per non-zero configured DCP (never one for
//! day 0 — that is the implicit Done checkpoint), daily events filling the
//! gaps, and a clean queue at loop exit.

use rm_simulator_core_rs::{
    BookingCurve, Demand, DemandGenerator, EngineEvent, SimulationControls, SimulationEngine,
};

const DCPS: &[u32] = &[63, 56, 49, 42, 35, 31, 28, 24, 21, 17, 14, 10, 7, 5, 3, 1, 0];

fn engine_with_demand() -> SimulationEngine {
    let mut engine = SimulationEngine::new("dcptest");
    engine.set_dcps(DCPS.to_vec());
    engine.set_base_time(1_577_836_800);

    let mut curve = BookingCurve::new("leisure");
    curve.add_dcp(63, 0.06);
    curve.add_dcp(35, 0.30);
    curve.add_dcp(14, 0.68);
    curve.add_dcp(1, 0.99);
    engine.add_curve(curve);

    let mut dmd = Demand::new("BOS", "ORD", "leisure");
    dmd.base_demand = 80.0;
    engine.add_demand(dmd);
    engine.reset_counters();
    engine
}

#[test]
fn test_one_event_per_nonzero_dcp() {
    let mut engine = engine_with_demand();
    engine.reseed(&[42, 0, 0]);
    DemandGenerator::new(&SimulationControls::default())
        .generate_demands(&mut engine, None)
        .unwrap();

    let mut seen = Vec::new();
    loop {
        match engine.go() {
            EngineEvent::Dcp { dcp, dcp_index } => {
                assert_ne!(dcp, 0, "day 0 must never be pre-scheduled");
                assert_eq!(DCPS[dcp_index], dcp, "dcp_index must match the schedule");
                seen.push(dcp);
            }
            EngineEvent::Daily { .. } => {}
            EngineEvent::Done => break,
        }
    }

    // Exactly len(dcp_list) - 1 events, in descending order.
    assert_eq!(seen.len(), DCPS.len() - 1);
    let expected: Vec<u32> = DCPS.iter().copied().filter(|&d| d != 0).collect();
    assert_eq!(seen, expected);
    assert_eq!(engine.num_events(), 0, "queue must be empty after Done");
}

#[test]
fn test_dcp_events_interleave_with_arrivals_in_time_order() {
    let mut engine = engine_with_demand();
    engine.reseed(&[42, 0, 0]);
    DemandGenerator::new(&SimulationControls::default())
        .generate_demands(&mut engine, None)
        .unwrap();

    // Between consecutive DCP checkpoints, the sales counter can only
    // grow; every arrival is consumed before the checkpoint that closes
    // its timeframe.
    let mut last_sold = 0;
    loop {
        match engine.go() {
            EngineEvent::Dcp { .. } => {
                let sold = engine.demands()[0].sold;
                assert!(sold >= last_sold);
                last_sold = sold;
            }
            EngineEvent::Daily { .. } => {}
            EngineEvent::Done => break,
        }
    }
}

#[test]
fn test_daily_events_fill_every_gap_day() {
    let mut engine = engine_with_demand();
    let generator = DemandGenerator::new(&SimulationControls::default());
    generator.generate_dcp_rm_events(&mut engine);

    let mut daily = Vec::new();
    loop {
        match engine.go() {
            EngineEvent::Daily { days_prior } => daily.push(days_prior),
            EngineEvent::Dcp { .. } => {}
            EngineEvent::Done => break,
        }
    }

    // Horizon is 0..63 exclusive; every day that is not itself a DCP gets
    // one daily event.
    let expected: Vec<u32> = (0..63).filter(|d| !DCPS.contains(d)).collect();
    let mut sorted = daily.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, expected);
}

#[test]
fn test_dcp_hour_shifts_event_times() {
    let mut early = engine_with_demand();
    early.set_dcp_hour(0);
    let mut late = engine_with_demand();
    late.set_dcp_hour(6);

    // Same schedule, shifted by six hours: both drain to Done with the
    // same number of checkpoints.
    let generator = DemandGenerator::new(&SimulationControls::default());
    generator.generate_dcp_rm_events(&mut early);
    generator.generate_dcp_rm_events(&mut late);
    assert_eq!(early.num_events(), late.num_events());
}
