//! Fare model

use serde::{Deserialize, Serialize};

/// One published fare: carrier + market + booking class + price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fare {
    pub carrier: String,
    pub orig: String,
    pub dest: String,
    pub booking_class: String,
    pub price: f64,

    /// Advance-purchase requirement in days; 0 means none.
    pub adv_purch: u32,

    // Per-sample counters
    pub sold: u64,
    pub sold_business: u64,
    pub revenue: f64,

    // Grand totals, accumulated after the burn period
    pub gt_sold: u64,
    pub gt_revenue: f64,
}

impl Fare {
    pub fn new(
        carrier: impl Into<String>,
        orig: impl Into<String>,
        dest: impl Into<String>,
        booking_class: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            carrier: carrier.into(),
            orig: orig.into(),
            dest: dest.into(),
            booking_class: booking_class.into(),
            price,
            adv_purch: 0,
            sold: 0,
            sold_business: 0,
            revenue: 0.0,
            gt_sold: 0,
            gt_revenue: 0.0,
        }
    }

    /// Whether this fare may still be sold `days_prior` days before departure.
    pub fn purchasable(&self, days_prior: u32) -> bool {
        days_prior >= self.adv_purch
    }

    pub(crate) fn reset_sample(&mut self) {
        self.sold = 0;
        self.sold_business = 0;
        self.revenue = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_purchase_window() {
        let mut fare = Fare::new("AL1", "BOS", "ORD", "Y2", 200.0);
        fare.adv_purch = 14;

        assert!(fare.purchasable(21));
        assert!(fare.purchasable(14));
        assert!(!fare.purchasable(13));
        assert!(!fare.purchasable(0));
    }
}
