//! Revenue-management step pipeline
//!
//! An RM system is a named set of processes, each an ordered list of
//! polymorphic steps (untruncation, forecasting, optimization, or
//! registered user steps). Every step declares the data tags it `requires`
//! and `produces`; at configuration-load time each process is walked in
//! order to prove that every requirement is produced by an earlier step (or
//! is a primitive that is always available, like raw booking history).
//! A violation is a configuration error — it surfaces before any sample is
//! simulated, never as a runtime exception mid-run.
//!
//! # Execution contract
//!
//! At each DCP boundary the control loop captures leg/path snapshots and
//! then runs each airline's `"dcp"` process steps in declared order. Steps
//! read and mutate shared per-leg/per-bucket forecast state. Steps for
//! different airlines are independent. An error inside a step aborts the
//! entire run; partial RM state is meaningless for subsequent DCPs.
//!
//! # Extension
//!
//! User steps register in [`StepRegistry`] under a unique `step_type` tag,
//! at process start. There is no dynamic subclass discovery: the registry
//! is the single, explicit source of step implementations.

pub mod forecast;
pub mod optimization;
mod registry;
mod system;
pub mod untruncation;

pub use registry::{StepBuilder, StepRegistry};
pub use system::{RmSystem, DAILY_PROCESS, DCP_PROCESS};

use crate::engine::SimulationEngine;
use crate::error::StepFailure;

/// Data tags exchanged between pipeline steps.
pub mod tags {
    /// Raw historical bookings; always available, never needs producing.
    pub const RAW_BOOKINGS: &str = "raw_bookings";
    /// Closed-period-corrected demand history.
    pub const LEG_DEMAND: &str = "leg_demand";
    /// Per-bucket demand-to-come forecasts.
    pub const LEG_FORECAST: &str = "leg_forecast";
    /// Per-bucket seat allocations.
    pub const LEG_ALLOCATIONS: &str = "leg_allocations";

    /// Tags that are externally guaranteed before any step runs.
    pub const BASELINE: &[&str] = &[RAW_BOOKINGS];
}

/// One step of an RM process.
///
/// Implementations should be idempotent when re-run with the same inputs;
/// the only ordering guarantee is declared order within one process for one
/// airline.
pub trait RmStep: Send {
    /// Configured instance name (may be empty).
    fn name(&self) -> &str;

    /// The registry tag this step was built from.
    fn step_type(&self) -> &str;

    /// Data tags that must be produced by an earlier step (or be baseline).
    fn requires(&self) -> Vec<String> {
        Vec::new()
    }

    /// Data tags this step makes available to later steps.
    fn produces(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run the step for one airline at one DCP.
    fn run(
        &mut self,
        engine: &mut SimulationEngine,
        airline: &str,
        dcp_index: usize,
        dcp: u32,
    ) -> Result<(), StepFailure>;
}

impl std::fmt::Debug for dyn RmStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RmStep")
            .field("name", &self.name())
            .field("step_type", &self.step_type())
            .finish()
    }
}
