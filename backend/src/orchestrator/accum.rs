//! Timeframe sales accumulators
//!
//! Explicit state owned by the control loop (not ambient globals): running
//! fare-sales tallies keyed by segment/carrier/class and timeframe, fed at
//! every DCP boundary and reset at trial boundaries.

use crate::engine::SimulationEngine;
use std::collections::BTreeMap;

/// Fare sales accumulated by timeframe across the run.
#[derive(Debug, Default, Clone)]
pub struct TimeframeAccumulators {
    /// `(segment, dcp)` → cumulative sold; segment is "business"/"leisure".
    pub fare_sales_by_dcp: BTreeMap<(String, u32), i64>,

    /// `(carrier, dcp)` → cumulative sold.
    pub fare_sales_by_airline_dcp: BTreeMap<(String, u32), i64>,

    /// `(carrier, booking_class, dcp)` → cumulative sold.
    pub fare_details_sold: BTreeMap<(String, String, u32), i64>,

    /// `(carrier, booking_class, dcp)` → cumulative business sold.
    pub fare_details_sold_business: BTreeMap<(String, String, u32), i64>,

    /// `(carrier, booking_class, dcp)` → cumulative revenue.
    pub fare_details_revenue: BTreeMap<(String, String, u32), f64>,
}

impl TimeframeAccumulators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the current cumulative fare counters into the timeframe that
    /// just closed (the DCP one position earlier in the schedule).
    pub fn accumulate(&mut self, engine: &SimulationEngine, dcp_index: usize) {
        if dcp_index == 0 {
            return;
        }
        let prev_dcp = engine.dcps()[dcp_index - 1];

        for fare in engine.fares() {
            let sold = fare.sold as i64;
            let sold_business = fare.sold_business as i64;
            let sold_leisure = sold - sold_business;

            *self
                .fare_sales_by_dcp
                .entry(("business".to_string(), prev_dcp))
                .or_insert(0) += sold_business;
            *self
                .fare_sales_by_dcp
                .entry(("leisure".to_string(), prev_dcp))
                .or_insert(0) += sold_leisure;

            *self
                .fare_sales_by_airline_dcp
                .entry((fare.carrier.clone(), prev_dcp))
                .or_insert(0) += sold;

            let key = (fare.carrier.clone(), fare.booking_class.clone(), prev_dcp);
            *self.fare_details_sold.entry(key.clone()).or_insert(0) += sold;
            *self
                .fare_details_sold_business
                .entry(key.clone())
                .or_insert(0) += sold_business;
            *self.fare_details_revenue.entry(key).or_insert(0.0) += fare.price * sold as f64;
        }
    }

    /// Trial boundary: start over.
    pub fn reset(&mut self) {
        self.fare_sales_by_dcp.clear();
        self.fare_sales_by_airline_dcp.clear();
        self.fare_details_sold.clear();
        self.fare_details_sold_business.clear();
        self.fare_details_revenue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Fare;

    fn engine_with_sales() -> SimulationEngine {
        let mut engine = SimulationEngine::new("test");
        engine.set_dcps(vec![63, 35, 7, 0]);
        let mut fare = Fare::new("AL1", "BOS", "ORD", "Y1", 100.0);
        fare.sold = 10;
        fare.sold_business = 4;
        engine.add_fare(fare);
        engine
    }

    #[test]
    fn test_accumulate_attributes_to_previous_dcp() {
        let engine = engine_with_sales();
        let mut accum = TimeframeAccumulators::new();

        accum.accumulate(&engine, 1);

        assert_eq!(accum.fare_sales_by_dcp[&("business".to_string(), 63)], 4);
        assert_eq!(accum.fare_sales_by_dcp[&("leisure".to_string(), 63)], 6);
        assert_eq!(accum.fare_sales_by_airline_dcp[&("AL1".to_string(), 63)], 10);
    }

    #[test]
    fn test_dcp_index_zero_is_a_no_op() {
        let engine = engine_with_sales();
        let mut accum = TimeframeAccumulators::new();
        accum.accumulate(&engine, 0);
        assert!(accum.fare_sales_by_dcp.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let engine = engine_with_sales();
        let mut accum = TimeframeAccumulators::new();
        accum.accumulate(&engine, 2);
        accum.reset();
        assert!(accum.fare_sales_by_dcp.is_empty());
        assert!(accum.fare_details_sold.is_empty());
    }
}
