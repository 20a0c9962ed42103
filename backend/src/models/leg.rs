//! Leg and bucket models
//!
//! A leg is a single flight segment with a fixed capacity, carved into
//! booking-class buckets. Buckets carry the forecast state the RM steps
//! read and write at each DCP, plus the per-departure sales history used
//! by untruncation and forecasting.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of past departures of bucket history kept for forecasting.
pub const HISTORY_DEPARTURES: usize = 26;

/// One booking class on one leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub booking_class: String,

    /// Authorized seat allocation (set initially from capacity, then by
    /// the optimization step).
    pub alloc: f64,

    pub sold: u64,
    pub revenue: f64,

    /// Fare used when the optimizer ranks this bucket.
    pub decision_fare: f64,

    // Forecast state, written by RM steps
    pub fcst_mean: f64,
    pub fcst_std_dev: f64,
    pub fcst_revenue: f64,

    /// Sales recorded per timeframe for the departure in progress.
    pub sold_by_tf: Vec<f64>,

    /// Timeframes during which this bucket rejected a booking for lack of
    /// allocation. Used by untruncation to correct observed demand.
    pub closed_by_tf: Vec<bool>,

    /// Closed-period-corrected demand per timeframe, one row per historical
    /// departure. Rebuilt by the untruncation step; read by forecasting.
    pub untruncated_history: Vec<Vec<f64>>,

    /// Observed sales/closure history for past departures, newest last.
    pub history: VecDeque<BucketDeparture>,
}

/// One past departure's observations for a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketDeparture {
    pub sold_by_tf: Vec<f64>,
    pub closed_by_tf: Vec<bool>,
}

impl Bucket {
    pub fn new(booking_class: impl Into<String>, alloc: f64) -> Self {
        Self {
            booking_class: booking_class.into(),
            alloc,
            sold: 0,
            revenue: 0.0,
            decision_fare: 0.0,
            fcst_mean: 0.0,
            fcst_std_dev: 0.0,
            fcst_revenue: 0.0,
            sold_by_tf: Vec::new(),
            closed_by_tf: Vec::new(),
            untruncated_history: Vec::new(),
            history: VecDeque::new(),
        }
    }

    /// Seats still available in this bucket.
    pub fn available(&self) -> f64 {
        self.alloc - self.sold as f64
    }

    /// Record one sale during timeframe `tf_index`.
    pub fn record_sale(&mut self, price: f64, tf_index: usize) {
        self.sold += 1;
        self.revenue += price;
        if let Some(slot) = self.sold_by_tf.get_mut(tf_index) {
            *slot += 1.0;
        }
    }

    /// Flag this bucket closed for timeframe `tf_index`.
    pub fn record_closure(&mut self, tf_index: usize) {
        if let Some(slot) = self.closed_by_tf.get_mut(tf_index) {
            *slot = true;
        }
    }

    /// Archive the finished departure and clear per-sample state.
    pub(crate) fn roll_departure(&mut self, num_timeframes: usize, reset_alloc: f64) {
        if !self.sold_by_tf.is_empty() {
            self.history.push_back(BucketDeparture {
                sold_by_tf: std::mem::take(&mut self.sold_by_tf),
                closed_by_tf: std::mem::take(&mut self.closed_by_tf),
            });
            if self.history.len() > HISTORY_DEPARTURES {
                self.history.pop_front();
            }
        }
        self.sold = 0;
        self.revenue = 0.0;
        self.alloc = reset_alloc;
        self.sold_by_tf = vec![0.0; num_timeframes];
        self.closed_by_tf = vec![false; num_timeframes];
    }

    pub(crate) fn reset_history(&mut self, num_timeframes: usize, reset_alloc: f64) {
        self.history.clear();
        self.untruncated_history.clear();
        self.fcst_mean = 0.0;
        self.fcst_std_dev = 0.0;
        self.fcst_revenue = 0.0;
        self.sold = 0;
        self.revenue = 0.0;
        self.alloc = reset_alloc;
        self.sold_by_tf = vec![0.0; num_timeframes];
        self.closed_by_tf = vec![false; num_timeframes];
    }
}

/// A single flight segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub carrier: String,
    pub fltno: u32,
    pub orig: String,
    pub dest: String,

    pub capacity: f64,
    pub distance: f64,
    pub dep_time: i64,

    pub buckets: Vec<Bucket>,

    // Per-sample counters
    pub sold: u64,
    pub revenue: f64,

    // Grand totals, accumulated after the burn period
    pub gt_sold: u64,
    pub gt_revenue: f64,

    /// Cumulative sold captured at each DCP of the current sample.
    pub dcp_capture: Vec<f64>,
}

impl Leg {
    pub fn new(
        carrier: impl Into<String>,
        fltno: u32,
        orig: impl Into<String>,
        dest: impl Into<String>,
        capacity: f64,
    ) -> Self {
        Self {
            carrier: carrier.into(),
            fltno,
            orig: orig.into(),
            dest: dest.into(),
            capacity,
            distance: 0.0,
            dep_time: 0,
            buckets: Vec::new(),
            sold: 0,
            revenue: 0.0,
            gt_sold: 0,
            gt_revenue: 0.0,
            dcp_capture: Vec::new(),
        }
    }

    pub fn add_bucket(&mut self, bucket: Bucket) {
        self.buckets.push(bucket);
    }

    pub fn bucket_mut(&mut self, booking_class: &str) -> Option<&mut Bucket> {
        self.buckets
            .iter_mut()
            .find(|b| b.booking_class == booking_class)
    }

    /// Set the fare the optimizer uses to rank a class on this leg.
    pub fn set_bucket_decision_fare(&mut self, booking_class: &str, price: f64) {
        if let Some(bucket) = self.bucket_mut(booking_class) {
            bucket.decision_fare = price;
        }
    }

    /// Seats still open on the whole leg, regardless of class.
    pub fn seats_available(&self) -> f64 {
        self.capacity - self.sold as f64
    }

    /// Snapshot cumulative sales at a DCP boundary.
    pub fn capture_dcp(&mut self, dcp_index: usize) {
        if let Some(slot) = self.dcp_capture.get_mut(dcp_index) {
            *slot = self.sold as f64;
        }
    }

    pub(crate) fn reset_sample(&mut self, num_timeframes: usize) {
        self.sold = 0;
        self.revenue = 0.0;
        self.dcp_capture = vec![0.0; num_timeframes];
        let cap = self.capacity;
        for bucket in &mut self.buckets {
            bucket.roll_departure(num_timeframes, cap);
        }
    }

    /// Fresh-trial reset: clear the sample state AND the learning state
    /// (bucket history, forecasts). Grand totals span the whole run and
    /// are not touched.
    pub(crate) fn reset_history(&mut self, num_timeframes: usize) {
        self.sold = 0;
        self.revenue = 0.0;
        self.dcp_capture = vec![0.0; num_timeframes];
        let cap = self.capacity;
        for bucket in &mut self.buckets {
            bucket.reset_history(num_timeframes, cap);
        }
    }
}
