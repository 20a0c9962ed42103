//! Path model
//!
//! A path is a sellable itinerary over one or two legs. Counters mirror the
//! leg counters so reporting can aggregate at either level.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    pub orig: String,
    pub dest: String,

    /// Indices into the engine leg table, in travel order (one or two).
    pub leg_indices: Vec<usize>,

    pub path_quality_index: f64,

    // Per-sample counters
    pub sold: u64,
    pub revenue: f64,

    // Grand totals, accumulated after the burn period
    pub gt_sold: u64,
    pub gt_revenue: f64,

    /// Cumulative sold captured at each DCP of the current sample.
    pub dcp_capture: Vec<f64>,
}

impl Path {
    pub fn new(orig: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            orig: orig.into(),
            dest: dest.into(),
            leg_indices: Vec::new(),
            path_quality_index: 0.0,
            sold: 0,
            revenue: 0.0,
            gt_sold: 0,
            gt_revenue: 0.0,
            dcp_capture: Vec::new(),
        }
    }

    pub fn add_leg(&mut self, leg_index: usize) {
        self.leg_indices.push(leg_index);
    }

    pub fn num_legs(&self) -> usize {
        self.leg_indices.len()
    }

    pub fn capture_dcp(&mut self, dcp_index: usize) {
        if let Some(slot) = self.dcp_capture.get_mut(dcp_index) {
            *slot = self.sold as f64;
        }
    }

    pub(crate) fn reset_sample(&mut self, num_timeframes: usize) {
        self.sold = 0;
        self.revenue = 0.0;
        self.dcp_capture = vec![0.0; num_timeframes];
    }
}
