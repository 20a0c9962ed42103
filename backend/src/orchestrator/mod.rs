//! Orchestrator - trial/sample control loop
//!
//! Builds the engine object graph from a validated scenario and drives the
//! simulation to its summary tables. See `engine.rs` for the control loop,
//! `reports.rs` for the report builders, and `multi.rs` for the per-trial
//! worker pool.

pub mod accum;
pub mod engine;
mod multi;
mod reports;

pub use accum::TimeframeAccumulators;
pub use engine::{SampleDoneCallback, Simulation};
pub use multi::run_trials_parallel;
