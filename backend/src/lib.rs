//! Revenue-Management Simulator Core - Rust Engine
//!
//! Discrete-event airline revenue-management simulation with deterministic
//! execution.
//!
//! # Architecture
//!
//! - **core**: Simulation clock primitives
//! - **config**: Scenario schema and eager validation
//! - **models**: Domain types (Leg, Bucket, Demand, Fare, Path, Airline,
//!   BookingCurve)
//! - **engine**: Entity object graph, event queue, booking, timeframe
//!   allocation
//! - **arrivals**: Per-sample demand generation
//! - **rm**: RM step pipeline (untruncation / forecast / optimization plus
//!   registered user steps)
//! - **orchestrator**: Trial/sample control loop, reports, per-trial
//!   worker pool
//! - **store**: Persistence sinks (per-DCP detail snapshots)
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded, reseeded per sample)
//! 2. Configuration errors surface before any simulation time is spent
//! 3. The allocator schedules exactly one arrival event per realized
//!    passenger, checked fatally at the boundary

// Module declarations
pub mod arrivals;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod rm;
pub mod rng;
pub mod store;
pub mod summary;

// Re-exports for convenience
pub use arrivals::DemandGenerator;
pub use config::{ScenarioConfig, SimulationControls};
pub use engine::{EngineEvent, EventKind, SimulationEngine};
pub use error::{ConfigError, SimulationError, StepFailure};
pub use models::{Airline, BookingCurve, Bucket, Demand, Fare, Leg, Path};
pub use orchestrator::{run_trials_parallel, Simulation, TimeframeAccumulators};
pub use rm::{RmStep, RmSystem, StepRegistry};
pub use rng::RandomStream;
pub use store::{DetailSink, JsonlSink, MemorySink, NullSink, RunMetadata, SinkSettings};
pub use summary::SummaryTables;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn rm_simulator_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::simulation::PySimulation>()?;
    Ok(())
}
