//! S3 storage pricing for s3cost.
//!
//! [`PricingTable`] holds per-region, per-class tier schedules and
//! [`CostCalculator`] bills a byte count against them.

pub mod calculator;
pub mod error;
pub mod table;

pub use calculator::{BucketCost, CostCalculator, round_cents};
pub use error::PricingError;
pub use table::{ClassPricing, PricingTable, Schedule, Tier};
