//! Booking curves
//!
//! A booking curve describes the cumulative fraction of a market's eventual
//! demand that is expected to have arrived by each data collection point
//! (DCP). Demand generation uses the curve to split a sample's total demand
//! across timeframes.
//!
//! # Critical Invariants
//!
//! 1. DCPs run strictly decreasing toward departure (day 0)
//! 2. Cumulative fractions never decrease as departure approaches
//! 3. The fraction at DCP 0 is implicitly 1.0 (all demand has arrived)

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Cumulative arrival fraction by days prior to departure.
///
/// # Example
///
/// ```
/// use rm_simulator_core_rs::models::BookingCurve;
///
/// let mut curve = BookingCurve::new("leisure");
/// curve.add_dcp(63, 0.06);
/// curve.add_dcp(35, 0.30);
/// curve.add_dcp(7, 0.85);
/// curve.validate().unwrap();
///
/// assert_eq!(curve.cumulative_at(63), 0.06);
/// assert_eq!(curve.cumulative_at(0), 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCurve {
    name: String,

    /// `(days_prior, cumulative_fraction)` points, in insertion order.
    /// Configuration supplies them furthest-out first.
    points: Vec<(u32, f64)>,
}

impl BookingCurve {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append one `(days_prior, cumulative_fraction)` point.
    pub fn add_dcp(&mut self, days_prior: u32, fraction: f64) {
        self.points.push((days_prior, fraction));
    }

    pub fn points(&self) -> &[(u32, f64)] {
        &self.points
    }

    /// Check the monotonicity invariants, naming the offending point.
    ///
    /// Curves are validated once at configuration time; a curve that passes
    /// is immutable for the life of the run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.points.is_empty() {
            return Err(ConfigError::EmptyBookingCurve {
                curve: self.name.clone(),
            });
        }
        for pair in self.points.windows(2) {
            let (d_prev, f_prev) = pair[0];
            let (d_next, f_next) = pair[1];
            if d_next >= d_prev {
                return Err(ConfigError::CurveDcpsNotDecreasing {
                    curve: self.name.clone(),
                    dcp: d_next,
                });
            }
            if f_next < f_prev {
                return Err(ConfigError::CurveNotMonotonic {
                    curve: self.name.clone(),
                    dcp: d_next,
                    fraction: f_next,
                    prev_fraction: f_prev,
                });
            }
        }
        for &(dcp, fraction) in &self.points {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::CurveFractionOutOfRange {
                    curve: self.name.clone(),
                    dcp,
                    fraction,
                });
            }
        }
        Ok(())
    }

    /// Cumulative arrival fraction at `days_prior`, interpolating linearly
    /// between configured points. Beyond the furthest configured DCP the
    /// curve is flat; at day 0 it is 1.0 unless the curve pins it lower.
    pub fn cumulative_at(&self, days_prior: u32) -> f64 {
        let d = days_prior as f64;

        let first = self.points[0];
        if days_prior >= first.0 {
            return first.1;
        }

        for pair in self.points.windows(2) {
            let (d_hi, f_hi) = pair[0];
            let (d_lo, f_lo) = pair[1];
            if days_prior <= d_hi && days_prior >= d_lo {
                if d_hi == d_lo {
                    return f_lo;
                }
                let t = (d_hi as f64 - d) / (d_hi as f64 - d_lo as f64);
                return f_hi + t * (f_lo - f_hi);
            }
        }

        // Below the last configured point: interpolate toward 1.0 at day 0.
        let last = self.points[self.points.len() - 1];
        if last.0 == 0 {
            return last.1;
        }
        let t = (last.0 as f64 - d) / last.0 as f64;
        last.1 + t * (1.0 - last.1)
    }
}
