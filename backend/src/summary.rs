//! Summary tables
//!
//! Flat row structs produced at the end of a run, aggregated over all
//! samples outside the burn period. Serializable so callers can dump them
//! to JSON or feed external reporting.

use crate::store::RunMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSummaryRow {
    pub orig: String,
    pub dest: String,
    pub segment: String,
    pub sold: u64,
    pub revenue: f64,
    pub avg_fare: f64,
    pub gt_demand: f64,
    pub gt_sold: u64,
    pub gt_revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareSummaryRow {
    pub carrier: String,
    pub orig: String,
    pub dest: String,
    pub booking_class: String,
    pub price: f64,
    pub avg_sold: f64,
    pub avg_rev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegSummaryRow {
    pub carrier: String,
    pub flt_no: u32,
    pub orig: String,
    pub dest: String,
    pub avg_sold: f64,
    pub avg_rev: f64,
    /// Load factor in percent.
    pub lf: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSummaryRow {
    pub orig: String,
    pub dest: String,
    pub carrier1: String,
    pub flt_no1: u32,
    pub carrier2: Option<String>,
    pub flt_no2: Option<u32>,
    pub avg_sold: f64,
    pub avg_rev: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierSummaryRow {
    pub carrier: String,
    pub avg_sold: f64,
    /// System load factor (RPM / ASM), percent.
    pub sys_lf: f64,
    /// Simple average of per-leg load factors, percent.
    pub avg_leg_lf: f64,
    pub avg_rev: f64,
    pub avg_price: f64,
    /// Available seat miles per counted sample.
    pub asm: f64,
    /// Revenue passenger miles per counted sample.
    pub rpm: f64,
    #[serde(rename = "yield")]
    pub yield_: Option<f64>,
}

/// Cumulative fare sales attributed to a timeframe, split by segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeSummaryRow {
    pub dcp: u32,
    pub business: i64,
    pub leisure: i64,
}

/// The end-of-run report bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryTables {
    pub metadata: RunMetadata,
    pub demands: Vec<DemandSummaryRow>,
    pub fares: Vec<FareSummaryRow>,
    pub legs: Vec<LegSummaryRow>,
    pub paths: Vec<PathSummaryRow>,
    pub carriers: Vec<CarrierSummaryRow>,
    pub bookings_by_timeframe: Vec<TimeframeSummaryRow>,
}

impl SummaryTables {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
