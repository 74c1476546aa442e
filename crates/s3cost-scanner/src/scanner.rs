//! Scan orchestration.
//!
//! A run walks the bucket listing page by page and spawns one task per
//! bucket. Each bucket task walks that bucket's object listing and spawns one
//! task per page, then waits for all of them (the bucket's join barrier)
//! before pricing the bucket. The orchestrator collects finished buckets from
//! the bucket tasks' join handles; no lock is shared between buckets.
//!
//! Any listing error aborts the run. Returning early drops the outstanding
//! [`JoinSet`]s, which aborts every sibling task.

use std::sync::Arc;

use s3cost_core::{FailurePolicy, FilterSettings, ScanSettings};
use s3cost_pricing::CostCalculator;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::aggregate::{BucketAggregate, PartialAggregate};
use crate::bucket::Bucket;
use crate::error::{ScanError, ScanResult};
use crate::source::{BucketLister, BucketSummary, ObjectLister, ObjectSummary, Page};

// ---------------------------------------------------------------------------
// Phase / mode
// ---------------------------------------------------------------------------

/// Lifecycle of a scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPhase {
    /// Not started.
    #[default]
    Start,
    /// Walking the bucket listing.
    ListingBuckets,
    /// Every bucket is listed; waiting for bucket tasks.
    ScanningBuckets,
    /// Every bucket task has joined.
    Finalizing,
    /// The run completed.
    Done,
    /// The run stopped on a fatal error.
    Aborted,
}

/// How page tasks report into their bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationMode {
    /// Each object is recorded under the bucket's lock.
    #[default]
    Locked,
    /// Each page builds a [`PartialAggregate`] merged after the join.
    Merge,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counters of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    /// Bucket listing pages fetched.
    pub bucket_pages: u64,
    /// Buckets scanned.
    pub buckets_scanned: u64,
    /// Buckets dropped because no object passed the storage-class filter.
    pub buckets_excluded: u64,
    /// Object listing pages fetched.
    pub object_pages: u64,
    /// Objects listed, before filtering.
    pub objects_listed: u64,
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Reported buckets, in completion order.
    pub buckets: Vec<Bucket>,
    /// Run counters.
    pub stats: ScanStats,
}

impl ScanReport {
    /// Objects over every bucket.
    #[must_use]
    pub fn total_objects(&self) -> u64 {
        self.buckets.iter().map(|b| b.object_count).sum()
    }

    /// Bytes over every bucket.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.buckets.iter().map(|b| b.total_size).sum()
    }

    /// Cost over every priced bucket.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        s3cost_pricing::round_cents(self.buckets.iter().filter_map(|b| b.cost).sum())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// State shared with bucket tasks.
#[derive(Debug)]
struct BucketContext {
    objects: Arc<dyn ObjectLister>,
    calculator: CostCalculator,
    filter: FilterSettings,
    failure_policy: FailurePolicy,
    mode: AggregationMode,
}

/// Outcome of one bucket task.
#[derive(Debug)]
struct BucketOutcome {
    bucket: Option<Bucket>,
    object_pages: u64,
    objects_listed: u64,
}

/// Drives one scan run over a bucket and an object lister.
#[derive(Debug)]
pub struct ScanOrchestrator {
    buckets: Arc<dyn BucketLister>,
    context: Arc<BucketContext>,
    phase: watch::Sender<ScanPhase>,
    #[cfg(test)]
    history: parking_lot::Mutex<Vec<ScanPhase>>,
}

impl ScanOrchestrator {
    /// Create an orchestrator pricing with AWS list prices.
    pub fn new(
        buckets: Arc<dyn BucketLister>,
        objects: Arc<dyn ObjectLister>,
        settings: &ScanSettings,
    ) -> Self {
        Self::with_options(
            buckets,
            objects,
            settings,
            CostCalculator::default(),
            AggregationMode::default(),
        )
    }

    /// Create an orchestrator with an explicit calculator and aggregation mode.
    pub fn with_options(
        buckets: Arc<dyn BucketLister>,
        objects: Arc<dyn ObjectLister>,
        settings: &ScanSettings,
        calculator: CostCalculator,
        mode: AggregationMode,
    ) -> Self {
        let context = BucketContext {
            objects,
            calculator,
            filter: settings.filter.clone(),
            failure_policy: settings.failure_policy,
            mode,
        };
        Self {
            buckets,
            context: Arc::new(context),
            phase: watch::Sender::new(ScanPhase::Start),
            #[cfg(test)]
            history: parking_lot::Mutex::default(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ScanPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScanPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: ScanPhase) {
        info!(phase = ?phase, "scan phase");
        #[cfg(test)]
        self.history.lock().push(phase);
        self.phase.send_replace(phase);
    }

    /// Run the scan to completion.
    ///
    /// # Errors
    ///
    /// Any listing failure, a task failure, or (under
    /// [`FailurePolicy::FailFast`]) a pricing failure. Nothing is reported
    /// when an error is returned.
    pub async fn run(&self) -> ScanResult<ScanReport> {
        match self.scan().await {
            Ok(report) => {
                self.enter(ScanPhase::Done);
                Ok(report)
            }
            Err(error) => {
                self.enter(ScanPhase::Aborted);
                Err(error)
            }
        }
    }

    async fn scan(&self) -> ScanResult<ScanReport> {
        self.enter(ScanPhase::ListingBuckets);

        let prefix = self.context.filter.bucket_prefix.as_str();
        let mut stats = ScanStats::default();
        let mut tasks = JoinSet::new();
        let mut continuation = None;

        loop {
            let Page { items, next } = self
                .buckets
                .list_buckets(prefix, continuation.take())
                .await
                .map_err(ScanError::ListBuckets)?;
            stats.bucket_pages += 1;
            debug!(page = stats.bucket_pages, buckets = items.len(), "listed bucket page");

            for summary in items {
                if !summary.name.starts_with(prefix) {
                    debug!(bucket = %summary.name, "bucket outside prefix, skipped");
                    continue;
                }
                stats.buckets_scanned += 1;
                tasks.spawn(scan_bucket(Arc::clone(&self.context), summary));
            }

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        self.enter(ScanPhase::ScanningBuckets);

        let mut buckets = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined??;
            stats.object_pages += outcome.object_pages;
            stats.objects_listed += outcome.objects_listed;
            match outcome.bucket {
                Some(bucket) => buckets.push(bucket),
                None => stats.buckets_excluded += 1,
            }
        }

        self.enter(ScanPhase::Finalizing);
        info!(
            buckets = buckets.len(),
            excluded = stats.buckets_excluded,
            objects = stats.objects_listed,
            "scan finished"
        );

        Ok(ScanReport { buckets, stats })
    }
}

/// Scan one bucket: fan out its object pages, join, then price it.
async fn scan_bucket(context: Arc<BucketContext>, summary: BucketSummary) -> ScanResult<BucketOutcome> {
    let aggregate = Arc::new(BucketAggregate::new(summary.name.clone(), context.filter.clone()));
    let mut pages = JoinSet::new();
    let mut continuation = None;
    let mut object_pages = 0;
    let mut objects_listed = 0;

    loop {
        let Page { items, next } = context
            .objects
            .list_objects(&summary, continuation.take())
            .await
            .map_err(|source| ScanError::ListObjects {
                bucket: summary.name.clone(),
                source,
            })?;
        object_pages += 1;
        objects_listed += items.len() as u64;
        debug!(bucket = %summary.name, page = object_pages, objects = items.len(), "listed object page");

        let aggregate = Arc::clone(&aggregate);
        let mode = context.mode;
        pages.spawn(async move { record_page(&aggregate, mode, &items) });

        match next {
            Some(token) => continuation = Some(token),
            None => break,
        }
    }

    while let Some(joined) = pages.join_next().await {
        if let Some(partial) = joined? {
            aggregate.merge(partial);
        }
    }

    let totals = aggregate.finalize();
    if context.filter.filters_storage_class() && totals.object_count() == 0 {
        debug!(bucket = %summary.name, "no object matches the storage-class filter, bucket excluded");
        return Ok(BucketOutcome {
            bucket: None,
            object_pages,
            objects_listed,
        });
    }

    let bucket = Bucket::new(summary, &totals);
    let bucket = match context
        .calculator
        .bucket_cost(&bucket.region, &bucket.sizes_by_class())
    {
        Ok(cost) => bucket.with_cost(cost),
        Err(source) => match context.failure_policy {
            FailurePolicy::FailFast => {
                return Err(ScanError::Pricing {
                    bucket: bucket.name,
                    source,
                });
            }
            FailurePolicy::ReportPerBucket => {
                warn!(bucket = %bucket.name, error = %source, "bucket could not be priced");
                bucket.with_cost_error(&source)
            }
        },
    };

    debug!(bucket = %bucket.name, objects = bucket.object_count, size = bucket.total_size, "bucket scanned");
    Ok(BucketOutcome {
        bucket: Some(bucket),
        object_pages,
        objects_listed,
    })
}

/// Record one page of objects; returns the page's totals in merge mode.
fn record_page(
    aggregate: &BucketAggregate,
    mode: AggregationMode,
    objects: &[ObjectSummary],
) -> Option<PartialAggregate> {
    match mode {
        AggregationMode::Locked => {
            for object in objects {
                aggregate.record_object(object);
            }
            None
        }
        AggregationMode::Merge => {
            let mut partial = PartialAggregate::default();
            for object in objects {
                partial.record_object(object, aggregate.filter());
            }
            Some(partial)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use s3cost_core::StorageClass;

    use super::*;
    use crate::static_source::StaticLister;

    const GB: u64 = 1 << 30;

    fn object(key: &str, size_bytes: u64, storage_class: StorageClass) -> ObjectSummary {
        ObjectSummary {
            key: key.to_owned(),
            size_bytes,
            last_modified: Some(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()),
            storage_class,
        }
    }

    fn objects(count: usize, size_bytes: u64, class: &StorageClass) -> Vec<ObjectSummary> {
        (0..count)
            .map(|i| object(&format!("k{i}"), size_bytes, class.clone()))
            .collect()
    }

    fn settings(storage_class: Option<StorageClass>, failure_policy: FailurePolicy) -> ScanSettings {
        ScanSettings {
            filter: FilterSettings {
                bucket_prefix: String::new(),
                storage_class,
            },
            failure_policy,
            ..ScanSettings::default()
        }
    }

    fn orchestrator(lister: StaticLister, settings: &ScanSettings, mode: AggregationMode) -> ScanOrchestrator {
        let lister = Arc::new(lister);
        ScanOrchestrator::with_options(
            lister.clone(),
            lister,
            settings,
            CostCalculator::default(),
            mode,
        )
    }

    fn find<'a>(report: &'a ScanReport, name: &str) -> &'a Bucket {
        report
            .buckets
            .iter()
            .find(|b| b.name == name)
            .unwrap_or_else(|| panic!("bucket {name} missing"))
    }

    fn fixture() -> StaticLister {
        let mut mixed = objects(7, GB, &StorageClass::Standard);
        mixed.extend(objects(3, 2 * GB, &StorageClass::Glacier));
        StaticLister::new(3)
            .with_bucket(
                BucketSummary::new("app-logs", "us-east-1", None),
                objects(25, 24 * GB, &StorageClass::Standard),
            )
            .with_bucket(BucketSummary::new("app-mixed", "eu-west-3", None), mixed)
            .with_bucket(BucketSummary::new("app-empty", "us-west-2", None), vec![])
            .with_bucket(
                BucketSummary::new("backup", "sa-east-1", None),
                objects(2, GB, &StorageClass::DeepArchive),
            )
    }

    #[tokio::test]
    async fn test_should_scan_every_bucket() {
        let scan = orchestrator(fixture(), &ScanSettings::default(), AggregationMode::Locked);
        let report = scan.run().await.unwrap();

        assert_eq!(scan.phase(), ScanPhase::Done);
        assert_eq!(report.buckets.len(), 4);
        assert_eq!(report.stats.bucket_pages, 2);
        assert_eq!(report.stats.buckets_scanned, 4);
        assert_eq!(report.stats.objects_listed, 37);
        assert_eq!(report.total_objects(), 37);

        let logs = find(&report, "app-logs");
        assert_eq!(logs.object_count, 25);
        assert_eq!(logs.total_size, 600 * GB);
        // 50 * 0.023 + 450 * 0.022 + 100 * 0.021
        assert_eq!(logs.cost, Some(13.15));

        let empty = find(&report, "app-empty");
        assert_eq!(empty.object_count, 0);
        assert_eq!(empty.cost, Some(0.0));
        assert!(empty.most_recent_modified.is_none());
    }

    #[tokio::test]
    async fn test_should_produce_same_totals_in_merge_mode() {
        let locked = orchestrator(fixture(), &ScanSettings::default(), AggregationMode::Locked)
            .run()
            .await
            .unwrap();
        let merged = orchestrator(fixture(), &ScanSettings::default(), AggregationMode::Merge)
            .run()
            .await
            .unwrap();

        for bucket in &locked.buckets {
            assert_eq!(bucket, find(&merged, &bucket.name));
        }
    }

    #[tokio::test]
    async fn test_should_scan_only_prefixed_buckets() {
        let mut settings = ScanSettings::default();
        settings.filter.bucket_prefix = "app-".to_owned();
        let report = orchestrator(fixture(), &settings, AggregationMode::Locked)
            .run()
            .await
            .unwrap();

        assert_eq!(report.buckets.len(), 3);
        assert!(report.buckets.iter().all(|b| b.name.starts_with("app-")));
    }

    #[tokio::test]
    async fn test_should_exclude_buckets_without_filtered_class() {
        let settings = settings(Some(StorageClass::Glacier), FailurePolicy::FailFast);
        let report = orchestrator(fixture(), &settings, AggregationMode::Locked)
            .run()
            .await
            .unwrap();

        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.stats.buckets_excluded, 3);

        let mixed = find(&report, "app-mixed");
        assert_eq!(mixed.object_count, 3);
        assert_eq!(mixed.total_size, 6 * GB);
        assert_eq!(mixed.classes.len(), 1);
        assert!(mixed.classes.contains_key(&StorageClass::Glacier));
    }

    #[tokio::test]
    async fn test_should_abort_on_object_listing_failure() {
        let lister = fixture().failing_bucket("backup");
        let scan = orchestrator(lister, &ScanSettings::default(), AggregationMode::Locked);
        let err = scan.run().await.unwrap_err();

        assert!(matches!(err, ScanError::ListObjects { ref bucket, .. } if bucket == "backup"));
        assert_eq!(scan.phase(), ScanPhase::Aborted);
    }

    #[tokio::test]
    async fn test_should_abort_on_bucket_listing_failure() {
        let scan = orchestrator(
            fixture().failing_bucket_listing(),
            &ScanSettings::default(),
            AggregationMode::Locked,
        );
        assert!(matches!(scan.run().await, Err(ScanError::ListBuckets(_))));
        assert_eq!(scan.phase(), ScanPhase::Aborted);
    }

    fn unpriceable() -> StaticLister {
        StaticLister::new(10)
            .with_bucket(
                BucketSummary::new("express", "ca-central-1", None),
                objects(1, GB, &StorageClass::ExpressOnezone),
            )
            .with_bucket(
                BucketSummary::new("plain", "ca-central-1", None),
                objects(1, 100 * GB, &StorageClass::Standard),
            )
    }

    #[tokio::test]
    async fn test_should_fail_fast_on_pricing_error() {
        let settings = settings(None, FailurePolicy::FailFast);
        let err = orchestrator(unpriceable(), &settings, AggregationMode::Locked)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Pricing { ref bucket, .. } if bucket == "express"));
    }

    #[tokio::test]
    async fn test_should_report_pricing_error_per_bucket() {
        let settings = settings(None, FailurePolicy::ReportPerBucket);
        let report = orchestrator(unpriceable(), &settings, AggregationMode::Locked)
            .run()
            .await
            .unwrap();

        let express = find(&report, "express");
        assert!(express.cost.is_none());
        assert_eq!(
            express.cost_error.as_deref(),
            Some("EXPRESS_ONEZONE storage is not available in region ca-central-1")
        );
        // 50 * 0.025 + 50 * 0.024
        assert_eq!(find(&report, "plain").cost, Some(2.45));
        assert!((report.total_cost() - 2.45).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_should_price_unknown_region_at_zero() {
        let lister = StaticLister::new(10).with_bucket(
            BucketSummary::new("far", "mars-north-1", None),
            objects(1, 100 * GB, &StorageClass::Standard),
        );
        let report = orchestrator(lister, &ScanSettings::default(), AggregationMode::Locked)
            .run()
            .await
            .unwrap();
        assert_eq!(find(&report, "far").cost, Some(0.0));
    }

    fn is_subsequence(observed: &[ScanPhase], expected: &[ScanPhase]) -> bool {
        let mut expected = expected.iter();
        observed.iter().all(|phase| expected.any(|e| e == phase))
    }

    #[tokio::test]
    async fn test_should_publish_phase_transitions() {
        use ScanPhase::{Done, Finalizing, ListingBuckets, ScanningBuckets};

        let scan = orchestrator(fixture(), &ScanSettings::default(), AggregationMode::Locked);
        let mut receiver = scan.subscribe();
        assert_eq!(*receiver.borrow(), ScanPhase::Start);

        let watcher = tokio::spawn(async move {
            let mut observed = Vec::new();
            while receiver.changed().await.is_ok() {
                let phase = *receiver.borrow_and_update();
                observed.push(phase);
                if matches!(phase, Done | ScanPhase::Aborted) {
                    break;
                }
            }
            observed
        });

        scan.run().await.unwrap();

        let expected = [ListingBuckets, ScanningBuckets, Finalizing, Done];
        assert_eq!(*scan.history.lock(), expected);
        let observed = watcher.await.unwrap();
        assert_eq!(observed.last(), Some(&Done));
        assert!(is_subsequence(&observed, &expected), "{observed:?}");
    }

    #[tokio::test]
    async fn test_should_publish_aborted_after_bucket_listing_failure() {
        let scan = orchestrator(
            fixture().failing_bucket_listing(),
            &ScanSettings::default(),
            AggregationMode::Locked,
        );
        let mut receiver = scan.subscribe();
        scan.run().await.unwrap_err();

        assert_eq!(*scan.history.lock(), [ScanPhase::ListingBuckets, ScanPhase::Aborted]);
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), ScanPhase::Aborted);
    }

    #[tokio::test]
    async fn test_should_publish_aborted_after_object_listing_failure() {
        let scan = orchestrator(
            fixture().failing_bucket("app-logs"),
            &ScanSettings::default(),
            AggregationMode::Merge,
        );
        let receiver = scan.subscribe();
        scan.run().await.unwrap_err();

        assert_eq!(
            *scan.history.lock(),
            [ScanPhase::ListingBuckets, ScanPhase::ScanningBuckets, ScanPhase::Aborted]
        );
        assert_eq!(*receiver.borrow(), ScanPhase::Aborted);
    }
}
