//! Error taxonomy
//!
//! Two layers, matching when problems can be detected:
//!
//! - [`ConfigError`]: anything detectable by looking at the scenario alone
//!   (malformed curves, dangling references, unsatisfiable RM pipelines).
//!   Raised before any simulation time is spent; a scenario that fails
//!   validation is never simulated against.
//! - [`SimulationError`]: invariant violations caught while a run is in
//!   flight. These are fatal and carry trial/sample context. There is no
//!   retry; partial RM state is meaningless for subsequent DCPs.
//!
//! Persistence write failures are deliberately NOT errors at this level:
//! the sink logs and skips bad rows (see `store`).

use thiserror::Error;

/// Configuration validation failure. Detected eagerly, never mid-run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("booking curve {curve:?} has no points")]
    EmptyBookingCurve { curve: String },

    #[error("booking curve {curve:?}: DCPs must strictly decrease, got {dcp} out of order")]
    CurveDcpsNotDecreasing { curve: String, dcp: u32 },

    #[error(
        "booking curve {curve:?}: cumulative fraction decreases at DCP {dcp} \
         ({prev_fraction} -> {fraction})"
    )]
    CurveNotMonotonic {
        curve: String,
        dcp: u32,
        fraction: f64,
        prev_fraction: f64,
    },

    #[error("booking curve {curve:?}: fraction {fraction} at DCP {dcp} outside (0, 1]")]
    CurveFractionOutOfRange {
        curve: String,
        dcp: u32,
        fraction: f64,
    },

    #[error("airline {airline:?} references unknown RM system {rm_system:?}")]
    UnknownRmSystem { airline: String, rm_system: String },

    #[error("demand {orig}-{dest}:{segment} references unknown booking curve {curve:?}")]
    UnknownBookingCurve {
        orig: String,
        dest: String,
        segment: String,
        curve: String,
    },

    #[error("path {orig}-{dest} references unknown leg {fltno}")]
    UnknownLeg {
        orig: String,
        dest: String,
        fltno: u32,
    },

    #[error("path {orig}-{dest}: leg {fltno} does not line up with the path endpoints")]
    PathEndpointMismatch {
        orig: String,
        dest: String,
        fltno: u32,
    },

    #[error("path {orig}-{dest} has {count} legs; paths carry one or two")]
    PathLegCount {
        orig: String,
        dest: String,
        count: usize,
    },

    #[error(
        "RM system {system:?}, process {process:?}: step {step:?} requires {tag:?}, \
         which no earlier step produces"
    )]
    MissingStepDependency {
        system: String,
        process: String,
        step: String,
        tag: String,
    },

    #[error("RM system {system:?} has steps but no \"dcp\" process")]
    MissingDcpProcess { system: String },

    #[error("RM step type {tag:?} registered twice")]
    DuplicateStepTag { tag: String },

    #[error("unknown RM step type {step_type:?}")]
    UnknownStepType { step_type: String },

    #[error("RM step type {step_type:?}: {message}")]
    InvalidStepParams { step_type: String, message: String },

    #[error("DCP schedule is empty")]
    EmptyDcpSchedule,

    #[error("DCP schedule must be strictly decreasing, got {dcp} out of order")]
    DcpScheduleNotDecreasing { dcp: u32 },

    #[error("DCP schedule must terminate at 0 (day of departure)")]
    DcpScheduleMissingZero,

    #[error("simulation control {name:?}: {message}")]
    InvalidControl { name: String, message: String },

    #[error("duplicate {kind} name {name:?}")]
    DuplicateName { kind: &'static str, name: String },
}

/// An RM step blew up while running. Always fatal for the whole run.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("step {step:?}: {message}")]
pub struct StepFailure {
    pub step: String,
    pub message: String,
}

/// Fatal runtime failure of a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The timeframe allocator scheduled a different number of arrival
    /// events than the realized passenger count. A defect in the allocator
    /// or configuration, never a transient condition.
    #[error(
        "demand allocation mismatch for {orig}-{dest}:{segment} \
         (trial {trial}, sample {sample}): num_pax={num_pax}, scheduled={num_events}"
    )]
    AllocationMismatch {
        orig: String,
        dest: String,
        segment: String,
        trial: u64,
        sample: u64,
        num_pax: u32,
        num_events: u32,
    },

    #[error(
        "event queue still has {remaining} events after Done \
         (trial {trial}, sample {sample})"
    )]
    EventQueueNotEmpty {
        trial: u64,
        sample: u64,
        remaining: usize,
    },

    #[error("RM system failed for airline {airline:?} at DCP {dcp} (trial {trial}, sample {sample})")]
    RmStepFailed {
        airline: String,
        dcp: u32,
        trial: u64,
        sample: u64,
        #[source]
        source: StepFailure,
    },

    #[error(
        "insufficient samples outside burn period for reporting: \
         num_trials={num_trials}, num_samples={num_samples}, burn_samples={burn_samples}"
    )]
    InsufficientSamples {
        num_trials: u64,
        num_samples: u64,
        burn_samples: u64,
    },
}
