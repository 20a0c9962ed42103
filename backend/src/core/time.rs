//! Time management for the simulation
//!
//! The simulation clock is measured in epoch seconds. Each sample simulates
//! one departure: the booking horizon runs from several weeks before the
//! departure day up to `base_time` (day of departure). Data collection
//! points (DCPs) are expressed in whole days prior to departure.

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Width of the opening timeframe, in days before the first DCP.
///
/// The booking curve only pins cumulative fractions at the configured DCPs;
/// arrivals allocated to the opening timeframe need a finite start time.
pub const FIRST_TIMEFRAME_DAYS: i64 = 7;

/// Concrete event time for a DCP checkpoint.
///
/// A DCP `d` days prior to departure fires at `dcp_hour` o'clock on that
/// day: `base_time - d*86400 + dcp_hour*3600`.
///
/// # Example
/// ```
/// use rm_simulator_core_rs::core::time::dcp_event_time;
///
/// let base = 1_577_836_800; // 2020-01-01 00:00:00 UTC
/// assert_eq!(dcp_event_time(base, 1, 0), base - 86_400);
/// assert_eq!(dcp_event_time(base, 7, 6), base - 7 * 86_400 + 6 * 3_600);
/// ```
pub fn dcp_event_time(base_time: i64, days_prior: u32, dcp_hour: u32) -> i64 {
    base_time - days_prior as i64 * SECONDS_PER_DAY + dcp_hour as i64 * SECONDS_PER_HOUR
}
