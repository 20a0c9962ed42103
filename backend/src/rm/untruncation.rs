//! Untruncation step
//!
//! Historical bucket sales understate demand whenever the bucket was closed
//! during part of the booking horizon. This step corrects the observed
//! history: for a timeframe in which the bucket was closed, the observation
//! is replaced by the average of that timeframe's observations across
//! departures where the bucket was open (kept if the closed observation is
//! already larger). The corrected history is what forecasting consumes.

use crate::config::StepSpec;
use crate::engine::SimulationEngine;
use crate::error::{ConfigError, StepFailure};
use crate::models::leg::BucketDeparture;
use crate::rm::{tags, RmStep};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct UntruncationParams {
    #[serde(default = "default_kind")]
    kind: String,
}

fn default_kind() -> String {
    "leg".to_string()
}

/// Booking-history untruncation over closed timeframes.
pub struct UntruncationStep {
    name: String,
}

impl UntruncationStep {
    pub fn from_spec(spec: &StepSpec) -> Result<Box<dyn RmStep>, ConfigError> {
        let params: UntruncationParams =
            serde_json::from_value(serde_json::Value::Object(spec.params.clone())).map_err(
                |e| ConfigError::InvalidStepParams {
                    step_type: "untruncation".to_string(),
                    message: e.to_string(),
                },
            )?;
        if params.kind != "leg" {
            return Err(ConfigError::InvalidStepParams {
                step_type: "untruncation".to_string(),
                message: format!("unsupported kind {:?}", params.kind),
            });
        }
        Ok(Box::new(Self {
            name: spec.name.clone(),
        }))
    }
}

impl RmStep for UntruncationStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn step_type(&self) -> &str {
        "untruncation"
    }

    fn produces(&self) -> Vec<String> {
        vec![tags::LEG_DEMAND.to_string()]
    }

    fn run(
        &mut self,
        engine: &mut SimulationEngine,
        airline: &str,
        _dcp_index: usize,
        _dcp: u32,
    ) -> Result<(), StepFailure> {
        for leg in engine.legs_mut().iter_mut() {
            if leg.carrier != airline {
                continue;
            }
            for bucket in &mut leg.buckets {
                bucket.untruncated_history = untruncate(bucket.history.make_contiguous());
            }
        }
        Ok(())
    }
}

/// Closed-period correction over one bucket's departure history.
fn untruncate(history: &[BucketDeparture]) -> Vec<Vec<f64>> {
    let num_tf = history.first().map(|d| d.sold_by_tf.len()).unwrap_or(0);

    // Average observation per timeframe over open periods only.
    let mut open_sum = vec![0.0; num_tf];
    let mut open_count = vec![0u32; num_tf];
    for departure in history {
        for t in 0..num_tf {
            if !departure.closed_by_tf[t] {
                open_sum[t] += departure.sold_by_tf[t];
                open_count[t] += 1;
            }
        }
    }

    history
        .iter()
        .map(|departure| {
            (0..num_tf)
                .map(|t| {
                    let observed = departure.sold_by_tf[t];
                    if departure.closed_by_tf[t] && open_count[t] > 0 {
                        observed.max(open_sum[t] / open_count[t] as f64)
                    } else {
                        observed
                    }
                })
                .collect()
        })
        .collect()
}
