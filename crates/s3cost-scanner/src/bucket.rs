//! Finalized bucket results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use s3cost_core::StorageClass;
use s3cost_pricing::{BucketCost, PricingError};
use serde::Serialize;

use crate::aggregate::PartialAggregate;
use crate::source::BucketSummary;

/// Usage and cost of one storage class within a bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUsage {
    /// Number of objects.
    pub object_count: u64,
    /// Bytes stored.
    pub size_bytes: u64,
    /// Monthly cost in USD; absent when the bucket could not be priced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// A scanned bucket with its totals and cost. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Bucket region.
    pub region: String,
    /// Creation time, if known.
    pub creation_date: Option<DateTime<Utc>>,
    /// Number of counted objects.
    pub object_count: u64,
    /// Sum of counted object sizes, in bytes.
    pub total_size: u64,
    /// Latest modification time of a counted object.
    pub most_recent_modified: Option<DateTime<Utc>>,
    /// Per storage class breakdown.
    pub classes: BTreeMap<StorageClass, ClassUsage>,
    /// Monthly cost in USD; absent when pricing failed.
    pub cost: Option<f64>,
    /// Pricing failure, reported instead of `cost`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_error: Option<String>,
}

impl Bucket {
    /// Build an unpriced bucket from its listing entry and totals.
    #[must_use]
    pub fn new(summary: BucketSummary, totals: &PartialAggregate) -> Self {
        let classes = totals
            .classes()
            .iter()
            .map(|(class, t)| {
                (
                    class.clone(),
                    ClassUsage {
                        object_count: t.object_count,
                        size_bytes: t.size_bytes,
                        cost: None,
                    },
                )
            })
            .collect();

        Self {
            name: summary.name,
            region: summary.region,
            creation_date: summary.creation_date,
            object_count: totals.object_count(),
            total_size: totals.total_size(),
            most_recent_modified: totals.most_recent_modified(),
            classes,
            cost: None,
            cost_error: None,
        }
    }

    /// Bytes per storage class.
    #[must_use]
    pub fn sizes_by_class(&self) -> BTreeMap<StorageClass, u64> {
        self.classes
            .iter()
            .map(|(class, usage)| (class.clone(), usage.size_bytes))
            .collect()
    }

    /// Attach a computed cost.
    #[must_use]
    pub fn with_cost(mut self, cost: BucketCost) -> Self {
        for (class, amount) in cost.by_class {
            if let Some(usage) = self.classes.get_mut(&class) {
                usage.cost = Some(amount);
            }
        }
        self.cost = Some(cost.total);
        self.cost_error = None;
        self
    }

    /// Attach a pricing failure in place of a cost.
    #[must_use]
    pub fn with_cost_error(mut self, error: &PricingError) -> Self {
        self.cost = None;
        self.cost_error = Some(error.to_string());
        self
    }
}
