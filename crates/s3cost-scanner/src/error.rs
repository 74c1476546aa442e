//! Scan error types.

use s3cost_pricing::PricingError;

/// A listing call (`ListBuckets`, `ListObjectsV2`, or a fixture) failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct ListingError {
    /// Name of the listing operation.
    pub operation: &'static str,
    /// Failure detail from the backend.
    pub message: String,
}

impl ListingError {
    /// Create a new listing error.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Error that ends a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The bucket listing failed.
    #[error("failed to list buckets")]
    ListBuckets(#[source] ListingError),

    /// The object listing of one bucket failed.
    #[error("failed to list objects of bucket {bucket}")]
    ListObjects {
        /// Bucket being listed.
        bucket: String,
        /// Underlying listing failure.
        #[source]
        source: ListingError,
    },

    /// The cost of one bucket could not be computed.
    #[error("failed to compute the cost of bucket {bucket}")]
    Pricing {
        /// Bucket being priced.
        bucket: String,
        /// Underlying pricing failure.
        #[source]
        source: PricingError,
    },

    /// A scan task panicked or was cancelled.
    #[error("scan task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience result alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
