//! Domain models for the revenue-management simulator

pub mod airline;
pub mod booking_curve;
pub mod demand;
pub mod fare;
pub mod leg;
pub mod path;

// Re-exports
pub use airline::Airline;
pub use booking_curve::BookingCurve;
pub use demand::Demand;
pub use fare::Fare;
pub use leg::{Bucket, BucketDeparture, Leg, HISTORY_DEPARTURES};
pub use path::Path;
