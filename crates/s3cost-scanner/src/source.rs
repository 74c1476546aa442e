//! Listing collaborators.
//!
//! The scanner never talks to S3 directly. It consumes two paginated
//! listings through [`BucketLister`] and [`ObjectLister`], which lets the
//! AWS SDK backend ([`crate::AwsLister`]) and the in-memory fixture
//! ([`crate::StaticLister`]) be swapped freely.
//!
//! Both traits use `#[async_trait]` so they can be held as
//! `Arc<dyn BucketLister>` and shared across spawned tasks.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3cost_core::StorageClass;
use serde::Serialize;

use crate::error::ListingError;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items of this page.
    pub items: Vec<T>,
    /// Continuation token of the next page; `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// A page that ends the listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// A bucket as returned by the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    /// Bucket name.
    pub name: String,
    /// Region the bucket lives in.
    pub region: String,
    /// When the bucket was created, if reported.
    pub creation_date: Option<DateTime<Utc>>,
}

impl BucketSummary {
    /// Create a bucket summary.
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        creation_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            creation_date,
        }
    }
}

/// An object as returned by the object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key; carried for logging only.
    pub key: String,
    /// Object size in bytes.
    pub size_bytes: u64,
    /// Last modification time, if reported.
    pub last_modified: Option<DateTime<Utc>>,
    /// Storage class of the object.
    pub storage_class: StorageClass,
}

/// Paginated source of buckets.
#[async_trait]
pub trait BucketLister: fmt::Debug + Send + Sync + 'static {
    /// Fetch one page of buckets whose name starts with `prefix`.
    ///
    /// `continuation` is `None` for the first page and the previous page's
    /// [`Page::next`] afterwards.
    async fn list_buckets(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<Page<BucketSummary>, ListingError>;
}

/// Paginated source of the objects of one bucket.
#[async_trait]
pub trait ObjectLister: fmt::Debug + Send + Sync + 'static {
    /// Fetch one page of the objects in `bucket`.
    async fn list_objects(
        &self,
        bucket: &BucketSummary,
        continuation: Option<String>,
    ) -> Result<Page<ObjectSummary>, ListingError>;
}
