//! Scenario configuration
//!
//! The validated, immutable description of everything a run needs: control
//! parameters, booking curves, RM systems, and the network (legs, demands,
//! fares, paths, airlines). Deserialized with serde from JSON; every
//! cross-reference and structural invariant is checked once, up front, so a
//! scenario that passes [`ScenarioConfig::validate`] can be simulated
//! without further configuration errors.
//!
//! # Validation contract
//!
//! Configuration errors surface before any simulation time is spent:
//! - booking curves must be monotonic (see `models::booking_curve`)
//! - the DCP schedule must strictly decrease and terminate at 0
//! - airlines must reference known RM systems
//! - demands must resolve to a known booking curve (explicit name, or the
//!   segment-named curve as fallback)
//! - paths must reference known legs whose endpoints line up
//! - every RM process must satisfy its steps' data dependencies in order

use crate::error::ConfigError;
use crate::rm::StepRegistry;
use crate::store::SinkSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// The original's standard data-collection-point schedule, in days prior
/// to departure, terminating on the day of departure.
pub const DEFAULT_DCP_LIST: &[u32] = &[
    63, 56, 49, 42, 35, 31, 28, 24, 21, 17, 14, 10, 7, 5, 3, 1, 0,
];

fn default_dcps() -> Vec<u32> {
    DEFAULT_DCP_LIST.to_vec()
}

// ============================================================================
// Simulation controls
// ============================================================================

fn default_num_trials() -> u64 {
    1
}
fn default_num_samples() -> u64 {
    600
}
fn default_burn_samples() -> u64 {
    100
}
fn default_sys_k() -> f64 {
    0.10
}
fn default_mkt_k() -> f64 {
    0.20
}
fn default_pax_type_k() -> f64 {
    0.40
}
fn default_tf_k() -> f64 {
    0.1
}
fn default_z_factor() -> f64 {
    2.0
}
fn default_demand_multiplier() -> f64 {
    1.0
}
fn default_base_time() -> i64 {
    1_577_836_800 // 2020-01-01 00:00:00 UTC
}

/// Run-level knobs. Mirrors the shape of the original's simulation-controls
/// block; unknown extra keys are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationControls {
    /// Complete simulations to run; each develops its samples sequentially.
    #[serde(default = "default_num_trials")]
    pub num_trials: u64,

    /// Samples (departures) per trial.
    #[serde(default = "default_num_samples")]
    pub num_samples: u64,

    /// Leading samples per trial used only to build forecast history;
    /// excluded from reported results.
    #[serde(default = "default_burn_samples")]
    pub burn_samples: u64,

    /// System-level demand randomness factor.
    #[serde(default = "default_sys_k")]
    pub sys_k_factor: f64,

    /// Market-level demand randomness factor.
    #[serde(default = "default_mkt_k")]
    pub mkt_k_factor: f64,

    /// Passenger-type demand randomness factor.
    #[serde(default = "default_pax_type_k")]
    pub pax_type_k_factor: f64,

    /// Dispersion of booking timing across timeframes.
    #[serde(default = "default_tf_k")]
    pub tf_k_factor: f64,

    /// Base demand variance control (`sigma = sqrt(|mu| * z_factor)`).
    #[serde(default = "default_z_factor")]
    pub z_factor: f64,

    /// Uniform scale applied to all base demand inputs.
    #[serde(default = "default_demand_multiplier")]
    pub demand_multiplier: f64,

    /// Optional extra independent noise term added to the demand
    /// perturbation, scaled by this factor.
    #[serde(default)]
    pub simple_k_factor: Option<f64>,

    /// Global seed. When set, the stream is reseeded from
    /// `(random_seed, trial, sample)` at every sample boundary; when unset
    /// the stream runs free and results are not reproducible across runs.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Log a one-line progress summary every N samples.
    #[serde(default)]
    pub update_frequency: Option<u64>,

    /// When set, leg capacities are doubled for samples `[0, n)` and
    /// restored at sample `n` (burn-in conditioning).
    #[serde(default)]
    pub double_capacity_until: Option<u64>,

    /// Departure instant (epoch seconds). Each sample's booking horizon
    /// ends here.
    #[serde(default = "default_base_time")]
    pub base_time: i64,

    /// Hour of day at which DCP checkpoints fire.
    #[serde(default)]
    pub dcp_hour: u32,
}

impl Default for SimulationControls {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).expect("defaults are valid")
    }
}

impl SimulationControls {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &str, message: &str| {
            Err(ConfigError::InvalidControl {
                name: name.to_string(),
                message: message.to_string(),
            })
        };
        if self.num_trials == 0 {
            return invalid("num_trials", "must be at least 1");
        }
        if self.num_samples == 0 {
            return invalid("num_samples", "must be at least 1");
        }
        for (name, value) in [
            ("sys_k_factor", self.sys_k_factor),
            ("mkt_k_factor", self.mkt_k_factor),
            ("pax_type_k_factor", self.pax_type_k_factor),
            ("tf_k_factor", self.tf_k_factor),
            ("z_factor", self.z_factor),
        ] {
            if !(value > 0.0 && value < 5.0) {
                return Err(ConfigError::InvalidControl {
                    name: name.to_string(),
                    message: format!("{} outside (0, 5)", value),
                });
            }
        }
        if self.demand_multiplier <= 0.0 {
            return invalid("demand_multiplier", "must be positive");
        }
        if self.dcp_hour >= 24 {
            return invalid("dcp_hour", "must be an hour of day (0-23)");
        }
        Ok(())
    }
}

// ============================================================================
// Network configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegConfig {
    pub carrier: String,
    pub fltno: u32,
    pub orig: String,
    pub dest: String,
    pub capacity: f64,
    #[serde(default)]
    pub dep_time: i64,
    #[serde(default)]
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandConfig {
    pub orig: String,
    pub dest: String,
    pub segment: String,
    pub base_demand: f64,
    pub reference_fare: f64,

    /// Choice model name; falls back to the segment name when unset. A
    /// demand whose resolved model is "business" is flagged business.
    #[serde(default)]
    pub choice_model: Option<String>,

    /// Booking curve name; falls back to the segment-named curve.
    #[serde(default)]
    pub curve: Option<String>,
}

impl DemandConfig {
    /// Choice model, falling back to the segment name if not set explicitly.
    pub fn choice_model(&self) -> &str {
        self.choice_model.as_deref().unwrap_or(&self.segment)
    }

    /// The booking curve this demand resolves to.
    pub fn resolved_curve(&self) -> &str {
        self.curve.as_deref().unwrap_or(&self.segment)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FareConfig {
    pub carrier: String,
    pub orig: String,
    pub dest: String,
    pub booking_class: String,
    pub price: f64,
    #[serde(default)]
    pub advance_purchase: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    pub orig: String,
    pub dest: String,
    /// Flight numbers in travel order (one or two legs).
    pub legs: Vec<u32>,
    #[serde(default)]
    pub path_quality_index: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AirlineConfig {
    pub rm_system: String,
}

/// Booking curve as configured: cumulative fraction by days prior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingCurveConfig {
    pub curve: BTreeMap<u32, f64>,
}

// ============================================================================
// RM system configuration
// ============================================================================

/// One step of an RM process, as configured.
///
/// `step_type` selects the implementation from the step registry; all other
/// keys are passed through to the step's own parameter parsing. This keeps
/// the config schema open for registered user steps without any dynamic
/// class machinery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSpec {
    pub step_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RmSystemConfig {
    /// Process name → ordered step list. The `"dcp"` process runs at every
    /// data collection point; an optional `"daily"` process runs on
    /// non-DCP days.
    pub processes: BTreeMap<String, Vec<StepSpec>>,
}

// ============================================================================
// Scenario
// ============================================================================

/// A complete scenario. Immutable after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: String,

    #[serde(default)]
    pub simulation_controls: SimulationControls,

    #[serde(default)]
    pub db: SinkSettings,

    #[serde(default)]
    pub rm_systems: BTreeMap<String, RmSystemConfig>,

    #[serde(default)]
    pub airlines: BTreeMap<String, AirlineConfig>,

    #[serde(default)]
    pub booking_curves: BTreeMap<String, BookingCurveConfig>,

    /// Booking classes, highest fare first. Every leg gets one bucket per
    /// class.
    #[serde(default)]
    pub classes: Vec<String>,

    /// Data collection points, strictly decreasing, ending at 0.
    #[serde(default = "default_dcps")]
    pub dcps: Vec<u32>,

    #[serde(default)]
    pub legs: Vec<LegConfig>,

    #[serde(default)]
    pub demands: Vec<DemandConfig>,

    #[serde(default)]
    pub fares: Vec<FareConfig>,

    #[serde(default)]
    pub paths: Vec<PathConfig>,
}

impl ScenarioConfig {
    /// Parse a scenario from JSON text. Parsing does not validate; call
    /// [`ScenarioConfig::validate`] before simulating.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check every structural invariant and cross-reference, including the
    /// RM pipelines' data-dependency ordering. An `Err` names the offender.
    pub fn validate(&self, registry: &StepRegistry) -> Result<(), ConfigError> {
        self.simulation_controls.validate()?;
        self.validate_dcps()?;

        for (name, curve_config) in &self.booking_curves {
            build_curve(name, curve_config).validate()?;
        }

        let mut fltnos = HashSet::new();
        for leg in &self.legs {
            if !fltnos.insert(leg.fltno) {
                return Err(ConfigError::DuplicateName {
                    kind: "leg",
                    name: leg.fltno.to_string(),
                });
            }
        }

        for dmd in &self.demands {
            let curve = dmd.resolved_curve();
            if !self.booking_curves.contains_key(curve) {
                return Err(ConfigError::UnknownBookingCurve {
                    orig: dmd.orig.clone(),
                    dest: dmd.dest.clone(),
                    segment: dmd.segment.clone(),
                    curve: curve.to_string(),
                });
            }
        }

        for (airline, airline_config) in &self.airlines {
            if !self.rm_systems.contains_key(&airline_config.rm_system) {
                return Err(ConfigError::UnknownRmSystem {
                    airline: airline.clone(),
                    rm_system: airline_config.rm_system.clone(),
                });
            }
        }

        for path in &self.paths {
            self.validate_path(path)?;
        }

        // Dry-build every RM system; this runs the requires/produces walk.
        for (name, system_config) in &self.rm_systems {
            crate::rm::RmSystem::build(name, system_config, registry)?;
        }

        Ok(())
    }

    fn validate_dcps(&self) -> Result<(), ConfigError> {
        if self.dcps.is_empty() {
            return Err(ConfigError::EmptyDcpSchedule);
        }
        for pair in self.dcps.windows(2) {
            if pair[1] >= pair[0] {
                return Err(ConfigError::DcpScheduleNotDecreasing { dcp: pair[1] });
            }
        }
        if *self.dcps.last().unwrap() != 0 {
            return Err(ConfigError::DcpScheduleMissingZero);
        }
        Ok(())
    }

    fn validate_path(&self, path: &PathConfig) -> Result<(), ConfigError> {
        if path.legs.is_empty() || path.legs.len() > 2 {
            return Err(ConfigError::PathLegCount {
                orig: path.orig.clone(),
                dest: path.dest.clone(),
                count: path.legs.len(),
            });
        }

        let find_leg = |fltno: u32| self.legs.iter().find(|l| l.fltno == fltno);

        let first = path.legs.first().and_then(|&f| find_leg(f));
        let Some(first_leg) = first else {
            return Err(ConfigError::UnknownLeg {
                orig: path.orig.clone(),
                dest: path.dest.clone(),
                fltno: path.legs.first().copied().unwrap_or(0),
            });
        };
        if first_leg.orig != path.orig {
            return Err(ConfigError::PathEndpointMismatch {
                orig: path.orig.clone(),
                dest: path.dest.clone(),
                fltno: first_leg.fltno,
            });
        }

        let last_fltno = *path.legs.last().unwrap();
        let Some(last_leg) = find_leg(last_fltno) else {
            return Err(ConfigError::UnknownLeg {
                orig: path.orig.clone(),
                dest: path.dest.clone(),
                fltno: last_fltno,
            });
        };
        if last_leg.dest != path.dest {
            return Err(ConfigError::PathEndpointMismatch {
                orig: path.orig.clone(),
                dest: path.dest.clone(),
                fltno: last_leg.fltno,
            });
        }
        Ok(())
    }
}

/// Materialize a configured curve, furthest-out point first.
pub(crate) fn build_curve(
    name: &str,
    config: &BookingCurveConfig,
) -> crate::models::BookingCurve {
    let mut curve = crate::models::BookingCurve::new(name);
    for (&dcp, &fraction) in config.curve.iter().rev() {
        curve.add_dcp(dcp, fraction);
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rm::StepRegistry;

    fn minimal_scenario() -> ScenarioConfig {
        serde_json::from_value(serde_json::json!({
            "scenario": "test",
            "classes": ["Y1"],
            "booking_curves": {
                "leisure": {"curve": {"63": 0.1, "35": 0.5, "7": 0.9}}
            },
            "legs": [
                {"carrier": "AL1", "fltno": 101, "orig": "BOS", "dest": "ORD", "capacity": 100}
            ],
            "demands": [
                {"orig": "BOS", "dest": "ORD", "segment": "leisure",
                 "base_demand": 100.0, "reference_fare": 250.0}
            ],
            "fares": [
                {"carrier": "AL1", "orig": "BOS", "dest": "ORD",
                 "booking_class": "Y1", "price": 250.0}
            ],
            "paths": [
                {"orig": "BOS", "dest": "ORD", "legs": [101]}
            ],
            "airlines": {"AL1": {"rm_system": "fcfs"}},
            "rm_systems": {"fcfs": {"processes": {"dcp": []}}}
        }))
        .unwrap()
    }

    #[test]
    fn test_minimal_scenario_validates() {
        let config = minimal_scenario();
        config.validate(&StepRegistry::with_builtins()).unwrap();
    }

    #[test]
    fn test_defaults_match_documented_k_factors() {
        let controls = SimulationControls::default();
        assert_eq!(controls.sys_k_factor, 0.10);
        assert_eq!(controls.mkt_k_factor, 0.20);
        assert_eq!(controls.pax_type_k_factor, 0.40);
        assert_eq!(controls.tf_k_factor, 0.1);
        assert_eq!(controls.z_factor, 2.0);
        assert_eq!(controls.num_samples, 600);
        assert_eq!(controls.burn_samples, 100);
    }

    #[test]
    fn test_unknown_rm_system_rejected() {
        let mut config = minimal_scenario();
        config
            .airlines
            .insert("AL2".to_string(), AirlineConfig { rm_system: "nope".to_string() });

        let err = config
            .validate(&StepRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRmSystem { .. }));
    }

    #[test]
    fn test_unknown_curve_rejected() {
        let mut config = minimal_scenario();
        config.demands[0].curve = Some("missing".to_string());

        let err = config
            .validate(&StepRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBookingCurve { curve, .. } if curve == "missing"));
    }

    #[test]
    fn test_dcps_must_end_at_zero() {
        let mut config = minimal_scenario();
        config.dcps = vec![63, 35, 7];

        let err = config
            .validate(&StepRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, ConfigError::DcpScheduleMissingZero));
    }

    #[test]
    fn test_path_endpoint_mismatch_rejected() {
        let mut config = minimal_scenario();
        config.paths[0].orig = "JFK".to_string();

        let err = config
            .validate(&StepRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, ConfigError::PathEndpointMismatch { .. }));
    }

    #[test]
    fn test_segment_fallback_curve() {
        let dmd: DemandConfig = serde_json::from_value(serde_json::json!({
            "orig": "BOS", "dest": "ORD", "segment": "leisure",
            "base_demand": 10.0, "reference_fare": 100.0
        }))
        .unwrap();
        assert_eq!(dmd.resolved_curve(), "leisure");
        assert_eq!(dmd.choice_model(), "leisure");
    }
}
