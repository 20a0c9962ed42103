//! Forecast step
//!
//! Additive-pickup forecast per bucket: for every historical departure, sum
//! the demand recorded from the current DCP onward; the forecast mean and
//! standard deviation of demand-to-come are the mean and deviation of those
//! pickups across departures. The first few samples of a trial have no
//! usable history and are skipped.

use crate::config::StepSpec;
use crate::engine::SimulationEngine;
use crate::error::{ConfigError, StepFailure};
use crate::rm::{tags, RmStep};
use serde::Deserialize;

/// Samples at the start of a trial with too little history to forecast.
const MIN_SAMPLES_FOR_FORECAST: u64 = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ForecastParams {
    #[serde(default = "default_algorithm")]
    algorithm: String,

    /// "untruncated" consumes the untruncation step's corrected history;
    /// "raw" forecasts straight from observed bookings.
    #[serde(default = "default_source")]
    source: String,
}

fn default_algorithm() -> String {
    "additive_pickup".to_string()
}

fn default_source() -> String {
    "untruncated".to_string()
}

/// Additive-pickup demand forecaster.
pub struct ForecastStep {
    name: String,
    use_untruncated: bool,
}

impl ForecastStep {
    pub fn from_spec(spec: &StepSpec) -> Result<Box<dyn RmStep>, ConfigError> {
        let params: ForecastParams =
            serde_json::from_value(serde_json::Value::Object(spec.params.clone())).map_err(
                |e| ConfigError::InvalidStepParams {
                    step_type: "forecast".to_string(),
                    message: e.to_string(),
                },
            )?;
        if params.algorithm != "additive_pickup" {
            return Err(ConfigError::InvalidStepParams {
                step_type: "forecast".to_string(),
                message: format!("unknown algorithm {:?}", params.algorithm),
            });
        }
        let use_untruncated = match params.source.as_str() {
            "untruncated" => true,
            "raw" => false,
            other => {
                return Err(ConfigError::InvalidStepParams {
                    step_type: "forecast".to_string(),
                    message: format!("unknown source {:?}", other),
                })
            }
        };
        Ok(Box::new(Self {
            name: spec.name.clone(),
            use_untruncated,
        }))
    }
}

impl RmStep for ForecastStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn step_type(&self) -> &str {
        "forecast"
    }

    fn requires(&self) -> Vec<String> {
        if self.use_untruncated {
            vec![tags::LEG_DEMAND.to_string()]
        } else {
            vec![tags::RAW_BOOKINGS.to_string()]
        }
    }

    fn produces(&self) -> Vec<String> {
        vec![tags::LEG_FORECAST.to_string()]
    }

    fn run(
        &mut self,
        engine: &mut SimulationEngine,
        airline: &str,
        dcp_index: usize,
        _dcp: u32,
    ) -> Result<(), StepFailure> {
        if engine.sample() < MIN_SAMPLES_FOR_FORECAST {
            return Ok(());
        }
        let use_untruncated = self.use_untruncated;
        for leg in engine.legs_mut().iter_mut() {
            if leg.carrier != airline {
                continue;
            }
            for bucket in &mut leg.buckets {
                let rows: Vec<Vec<f64>> = if use_untruncated {
                    bucket.untruncated_history.clone()
                } else {
                    bucket.history.iter().map(|d| d.sold_by_tf.clone()).collect()
                };
                if rows.is_empty() {
                    continue;
                }

                let pickups: Vec<f64> = rows
                    .iter()
                    .map(|row| row.iter().skip(dcp_index).sum())
                    .collect();

                let n = pickups.len() as f64;
                let mean = pickups.iter().sum::<f64>() / n;
                let variance =
                    pickups.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;

                bucket.fcst_mean = mean.max(0.0);
                bucket.fcst_std_dev = variance.sqrt();
                bucket.fcst_revenue = if bucket.sold > 0 {
                    bucket.revenue / bucket.sold as f64
                } else {
                    bucket.decision_fare
                };
            }
        }
        Ok(())
    }
}
