//! Concurrent S3 inventory scanning for s3cost.
//!
//! [`ScanOrchestrator`] fans out over buckets and object pages from a
//! [`BucketLister`] / [`ObjectLister`] pair, aggregates each bucket under its
//! own lock, and prices it with [`s3cost_pricing::CostCalculator`].

pub mod aggregate;
pub mod aws;
pub mod bucket;
pub mod error;
pub mod scanner;
pub mod source;
pub mod static_source;

pub use aggregate::{BucketAggregate, ClassTotals, PartialAggregate, RecordOutcome};
pub use aws::AwsLister;
pub use bucket::{Bucket, ClassUsage};
pub use error::{ListingError, ScanError, ScanResult};
pub use scanner::{AggregationMode, ScanOrchestrator, ScanPhase, ScanReport, ScanStats};
pub use source::{BucketLister, BucketSummary, ObjectLister, ObjectSummary, Page};
pub use static_source::StaticLister;
