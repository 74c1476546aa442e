//! Pricing lookup errors.

use s3cost_core::StorageClass;

/// Error raised when a storage cost cannot be priced.
///
/// Zero-cost cases (free storage classes, regions without price data) are
/// not errors; see [`crate::Schedule`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// The storage class is not offered in a region that otherwise has
    /// pricing data (e.g. `EXPRESS_ONEZONE` in `ca-central-1`).
    #[error("{storage_class} storage is not available in region {region}")]
    RateUnavailable {
        /// Region of the lookup.
        region: String,
        /// Storage class of the lookup.
        storage_class: StorageClass,
    },

    /// The schedule has fewer tiers than requested.
    #[error("no tier {tier} for {storage_class} in region {region}")]
    TierNotFound {
        /// Region of the lookup.
        region: String,
        /// Storage class of the lookup.
        storage_class: StorageClass,
        /// Zero-based tier index that was requested.
        tier: usize,
    },

    /// A tier schedule passed to [`crate::ClassPricing::tiered`] is malformed.
    #[error("invalid tier schedule: {0}")]
    InvalidSchedule(String),

    /// The storage class is not one s3cost knows how to price.
    #[error("invalid storage class {0}")]
    UnknownStorageClass(StorageClass),
}
