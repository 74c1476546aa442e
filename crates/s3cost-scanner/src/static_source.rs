//! In-memory listing backend.
//!
//! [`StaticLister`] serves fixed buckets and objects in pages of a chosen
//! size, with optional injected failures. Continuation tokens are plain
//! offsets.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::ListingError;
use crate::source::{BucketLister, BucketSummary, ObjectLister, ObjectSummary, Page};

/// Fixture lister implementing both [`BucketLister`] and [`ObjectLister`].
///
/// # Examples
///
/// ```
/// use s3cost_scanner::{BucketLister, BucketSummary, StaticLister};
///
/// let lister = StaticLister::new(2)
///     .with_bucket(BucketSummary::new("a", "us-east-1", None), Vec::new())
///     .with_bucket(BucketSummary::new("b", "us-east-1", None), Vec::new())
///     .with_bucket(BucketSummary::new("c", "us-east-1", None), Vec::new());
///
/// # tokio_test::block_on(async {
/// let first = lister.list_buckets("", None).await.unwrap();
/// assert_eq!(first.items.len(), 2);
/// let second = lister.list_buckets("", first.next).await.unwrap();
/// assert_eq!(second.items.len(), 1);
/// assert!(second.next.is_none());
/// # });
/// ```
#[derive(Debug, Default)]
pub struct StaticLister {
    page_size: usize,
    buckets: Vec<BucketSummary>,
    objects: HashMap<String, Vec<ObjectSummary>>,
    fail_bucket_listing: bool,
    failing_buckets: HashSet<String>,
    object_pages_served: AtomicU64,
}

impl StaticLister {
    /// Create an empty lister serving pages of `page_size` items.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Add a bucket and its objects.
    #[must_use]
    pub fn with_bucket(mut self, bucket: BucketSummary, objects: Vec<ObjectSummary>) -> Self {
        self.objects.insert(bucket.name.clone(), objects);
        self.buckets.push(bucket);
        self
    }

    /// Make every bucket listing call fail.
    #[must_use]
    pub fn failing_bucket_listing(mut self) -> Self {
        self.fail_bucket_listing = true;
        self
    }

    /// Make object listing of `bucket` fail.
    #[must_use]
    pub fn failing_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.failing_buckets.insert(bucket.into());
        self
    }

    /// Number of object pages served so far.
    #[must_use]
    pub fn object_pages_served(&self) -> u64 {
        self.object_pages_served.load(Ordering::Relaxed)
    }

    fn paginate<T: Clone>(
        &self,
        operation: &'static str,
        items: &[T],
        continuation: Option<&str>,
    ) -> Result<Page<T>, ListingError> {
        let start = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ListingError::new(operation, format!("invalid continuation token {token}")))?,
            None => 0,
        };
        let end = start.saturating_add(self.page_size).min(items.len());
        let page = items.get(start..end).unwrap_or_default().to_vec();
        let next = (end < items.len()).then(|| end.to_string());
        Ok(Page { items: page, next })
    }
}

#[async_trait]
impl BucketLister for StaticLister {
    async fn list_buckets(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<Page<BucketSummary>, ListingError> {
        if self.fail_bucket_listing {
            return Err(ListingError::new("ListBuckets", "injected failure"));
        }
        let matching: Vec<BucketSummary> = self
            .buckets
            .iter()
            .filter(|bucket| bucket.name.starts_with(prefix))
            .cloned()
            .collect();
        let page = self.paginate("ListBuckets", &matching, continuation.as_deref())?;
        tokio::task::yield_now().await;
        Ok(page)
    }
}

#[async_trait]
impl ObjectLister for StaticLister {
    async fn list_objects(
        &self,
        bucket: &BucketSummary,
        continuation: Option<String>,
    ) -> Result<Page<ObjectSummary>, ListingError> {
        if self.failing_buckets.contains(&bucket.name) {
            return Err(ListingError::new(
                "ListObjectsV2",
                format!("injected failure for {}", bucket.name),
            ));
        }
        let Some(objects) = self.objects.get(&bucket.name) else {
            return Err(ListingError::new(
                "ListObjectsV2",
                format!("NoSuchBucket: {}", bucket.name),
            ));
        };
        let page = self.paginate("ListObjectsV2", objects, continuation.as_deref())?;
        self.object_pages_served.fetch_add(1, Ordering::Relaxed);
        tokio::task::yield_now().await;
        Ok(page)
    }
}
