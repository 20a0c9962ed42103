//! Airline model

use serde::{Deserialize, Serialize};

/// A carrier participating in the simulation. Each airline runs exactly one
/// RM system, referenced by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub name: String,

    /// Name of the RM system this carrier runs at each DCP.
    pub rm_system: String,

    // Per-sample counters
    pub sold: u64,
    pub revenue: f64,

    // Grand totals, accumulated after the burn period
    pub gt_sold: u64,
    pub gt_revenue: f64,
}

impl Airline {
    pub fn new(name: impl Into<String>, rm_system: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rm_system: rm_system.into(),
            sold: 0,
            revenue: 0.0,
            gt_sold: 0,
            gt_revenue: 0.0,
        }
    }

    pub(crate) fn reset_sample(&mut self) {
        self.sold = 0;
        self.revenue = 0.0;
    }
}
