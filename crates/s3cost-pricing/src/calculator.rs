//! Tiered storage cost calculation.

use std::collections::BTreeMap;
use std::sync::Arc;

use s3cost_core::StorageClass;
use serde::Serialize;
use tracing::warn;

use crate::error::PricingError;
use crate::table::{PricingTable, Schedule};

/// Bytes per GB used for billing (binary gigabyte).
pub const BYTES_PER_GB: u64 = 1 << 30;

/// `STANDARD` first-tier rate used by [`CostCalculator::flat_estimate`].
pub const FLAT_ESTIMATE_RATE: f64 = 0.023;

/// Round a dollar amount to cents, half away from zero.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Monthly cost of one bucket, total and per storage class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketCost {
    /// Sum of the per-class costs, in USD.
    pub total: f64,
    /// Cost of each storage class, in USD.
    pub by_class: BTreeMap<StorageClass, f64>,
}

/// Computes storage costs against a [`PricingTable`].
#[derive(Debug, Clone)]
pub struct CostCalculator {
    table: Arc<PricingTable>,
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new(PricingTable::aws_default())
    }
}

impl CostCalculator {
    /// Create a calculator over `table`.
    #[must_use]
    pub fn new(table: Arc<PricingTable>) -> Self {
        Self { table }
    }

    /// Monthly cost of `size_bytes` of `storage_class` data in `region`.
    ///
    /// The size is floored to whole GB, each tier below it is billed for the
    /// GB that fall inside it, and the sum is rounded to cents once.
    ///
    /// # Errors
    ///
    /// Any [`PricingError`] from the table lookup. No default rate is ever
    /// substituted.
    pub fn tiered_cost(
        &self,
        size_bytes: u64,
        region: &str,
        storage_class: &StorageClass,
    ) -> Result<f64, PricingError> {
        let tiers = match self.table.schedule(region, storage_class)? {
            Schedule::Tiers(tiers) => tiers,
            Schedule::Free => return Ok(0.0),
            Schedule::UnsupportedRegion => {
                warn!(region, storage_class = %storage_class, "no pricing data for region, cost reported as zero");
                return Ok(0.0);
            }
        };

        let size_gb = size_bytes / BYTES_PER_GB;
        #[allow(clippy::cast_precision_loss)]
        let amount: f64 = tiers
            .iter()
            .take_while(|tier| tier.lower_gb < size_gb)
            .map(|tier| {
                let upper = tier.upper_gb.map_or(size_gb, |upper| upper.min(size_gb));
                upper.saturating_sub(tier.lower_gb) as f64 * tier.rate
            })
            .sum();

        Ok(round_cents(amount))
    }

    /// Cost of a bucket given its total size per storage class.
    ///
    /// # Errors
    ///
    /// The first [`PricingError`] met; the bucket then has no cost.
    pub fn bucket_cost(
        &self,
        region: &str,
        sizes: &BTreeMap<StorageClass, u64>,
    ) -> Result<BucketCost, PricingError> {
        let by_class = sizes
            .iter()
            .map(|(class, &size)| {
                self.tiered_cost(size, region, class)
                    .map(|cost| (class.clone(), cost))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let total = round_cents(by_class.values().sum());
        Ok(BucketCost { total, by_class })
    }

    /// Quick estimate at the `STANDARD` first-tier rate over the exact byte
    /// count, without tiers or GB flooring.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn flat_estimate(size_bytes: u64) -> f64 {
        round_cents(FLAT_ESTIMATE_RATE * size_bytes as f64 / 1024.0 / 1024.0 / 1024.0)
    }
}
