//! Per-bucket object aggregation.
//!
//! Page tasks of one bucket feed a shared [`BucketAggregate`] in one of two
//! ways:
//!
//! - [`BucketAggregate::record_object`] per object, under the bucket's own
//!   lock (held for one object at a time);
//! - or by folding their page into a lock-free [`PartialAggregate`] and
//!   handing it to [`BucketAggregate::merge`] once joined.
//!
//! Both produce the same end state. After the bucket's join barrier,
//! [`BucketAggregate::finalize`] seals the aggregate and returns its totals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use s3cost_core::{FilterSettings, StorageClass};
use serde::Serialize;
use tracing::warn;

use crate::source::ObjectSummary;

/// Result of offering an object (or a partial) to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The object was counted.
    Counted,
    /// The object did not pass the storage-class filter.
    Filtered,
    /// The aggregate was already finalized; nothing changed.
    Sealed,
}

/// Object count and byte total of one storage class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTotals {
    /// Number of objects.
    pub object_count: u64,
    /// Sum of object sizes, in bytes.
    pub size_bytes: u64,
}

/// Totals of a set of objects, keyed by storage class.
///
/// The set of observed classes is the key set of [`PartialAggregate::classes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAggregate {
    classes: BTreeMap<StorageClass, ClassTotals>,
    most_recent_modified: Option<DateTime<Utc>>,
}

impl PartialAggregate {
    /// Count `object` unless `filter` rejects its storage class.
    pub fn record_object(&mut self, object: &ObjectSummary, filter: &FilterSettings) -> RecordOutcome {
        if !filter.admits(&object.storage_class) {
            return RecordOutcome::Filtered;
        }
        self.count(object);
        RecordOutcome::Counted
    }

    fn count(&mut self, object: &ObjectSummary) {
        let totals = self.classes.entry(object.storage_class.clone()).or_default();
        totals.object_count += 1;
        totals.size_bytes += object.size_bytes;
        self.observe_modified(object.last_modified);
    }

    fn observe_modified(&mut self, last_modified: Option<DateTime<Utc>>) {
        if last_modified > self.most_recent_modified {
            self.most_recent_modified = last_modified;
        }
    }

    /// Add every total of `other` into `self`.
    pub fn absorb(&mut self, other: Self) {
        for (class, totals) in other.classes {
            let entry = self.classes.entry(class).or_default();
            entry.object_count += totals.object_count;
            entry.size_bytes += totals.size_bytes;
        }
        self.observe_modified(other.most_recent_modified);
    }

    /// Per-class totals.
    #[must_use]
    pub fn classes(&self) -> &BTreeMap<StorageClass, ClassTotals> {
        &self.classes
    }

    /// Latest modification time seen.
    #[must_use]
    pub fn most_recent_modified(&self) -> Option<DateTime<Utc>> {
        self.most_recent_modified
    }

    /// Number of objects over every class.
    #[must_use]
    pub fn object_count(&self) -> u64 {
        self.classes.values().map(|t| t.object_count).sum()
    }

    /// Bytes over every class.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.classes.values().map(|t| t.size_bytes).sum()
    }
}

#[derive(Debug, Default)]
struct Counters {
    totals: PartialAggregate,
    sealed: bool,
}

/// Mutable aggregate of one bucket, shared by that bucket's page tasks.
#[derive(Debug)]
pub struct BucketAggregate {
    bucket: String,
    filter: FilterSettings,
    counters: Mutex<Counters>,
}

impl BucketAggregate {
    /// Create an empty aggregate for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>, filter: FilterSettings) -> Self {
        Self {
            bucket: bucket.into(),
            filter,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Filter applied to recorded objects.
    #[must_use]
    pub fn filter(&self) -> &FilterSettings {
        &self.filter
    }

    /// Record one object.
    ///
    /// The filter check happens before the lock; the count, size, class
    /// and modification-time updates happen under it as one step.
    pub fn record_object(&self, object: &ObjectSummary) -> RecordOutcome {
        if !self.filter.admits(&object.storage_class) {
            return RecordOutcome::Filtered;
        }
        let mut counters = self.counters.lock();
        if counters.sealed {
            warn!(bucket = %self.bucket, key = %object.key, "object recorded after finalize, ignored");
            return RecordOutcome::Sealed;
        }
        counters.totals.count(object);
        RecordOutcome::Counted
    }

    /// Fold a page's partial totals into the bucket.
    pub fn merge(&self, partial: PartialAggregate) -> RecordOutcome {
        let mut counters = self.counters.lock();
        if counters.sealed {
            warn!(bucket = %self.bucket, objects = partial.object_count(), "page merged after finalize, ignored");
            return RecordOutcome::Sealed;
        }
        counters.totals.absorb(partial);
        RecordOutcome::Counted
    }

    /// Seal the aggregate and take its totals.
    ///
    /// Later calls return empty totals and later records are refused.
    pub fn finalize(&self) -> PartialAggregate {
        let mut counters = self.counters.lock();
        counters.sealed = true;
        std::mem::take(&mut counters.totals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn object(size: u64, class: StorageClass, modified_secs: Option<i64>) -> ObjectSummary {
        ObjectSummary {
            key: format!("obj-{size}"),
            size_bytes: size,
            last_modified: modified_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            storage_class: class,
        }
    }

    fn glacier_only() -> FilterSettings {
        FilterSettings {
            bucket_prefix: String::new(),
            storage_class: Some(StorageClass::Glacier),
        }
    }

    #[test]
    fn test_should_record_objects_per_class() {
        let aggregate = BucketAggregate::new("b", FilterSettings::default());
        aggregate.record_object(&object(10, StorageClass::Standard, Some(100)));
        aggregate.record_object(&object(20, StorageClass::Standard, Some(300)));
        aggregate.record_object(&object(5, StorageClass::Glacier, Some(200)));

        let totals = aggregate.finalize();
        assert_eq!(totals.object_count(), 3);
        assert_eq!(totals.total_size(), 35);
        assert_eq!(
            totals.classes()[&StorageClass::Standard],
            ClassTotals {
                object_count: 2,
                size_bytes: 30
            }
        );
        assert_eq!(totals.classes().len(), 2);
        assert_eq!(
            totals.most_recent_modified(),
            Some(Utc.timestamp_opt(300, 0).unwrap())
        );
    }

    #[test]
    fn test_should_skip_filtered_classes() {
        let aggregate = BucketAggregate::new("b", glacier_only());
        assert_eq!(
            aggregate.record_object(&object(10, StorageClass::Standard, Some(999))),
            RecordOutcome::Filtered
        );
        assert_eq!(
            aggregate.record_object(&object(7, StorageClass::Glacier, Some(1))),
            RecordOutcome::Counted
        );

        let totals = aggregate.finalize();
        assert_eq!(totals.object_count(), 1);
        assert_eq!(totals.total_size(), 7);
        assert_eq!(totals.most_recent_modified(), Some(Utc.timestamp_opt(1, 0).unwrap()));
    }

    #[test]
    fn test_should_only_move_modified_date_forward() {
        let mut partial = PartialAggregate::default();
        let filter = FilterSettings::default();
        partial.record_object(&object(1, StorageClass::Standard, Some(500)), &filter);
        partial.record_object(&object(1, StorageClass::Standard, Some(100)), &filter);
        partial.record_object(&object(1, StorageClass::Standard, None), &filter);
        assert_eq!(
            partial.most_recent_modified(),
            Some(Utc.timestamp_opt(500, 0).unwrap())
        );
    }

    #[test]
    fn test_should_refuse_records_after_finalize() {
        let aggregate = BucketAggregate::new("b", FilterSettings::default());
        aggregate.record_object(&object(1, StorageClass::Standard, None));
        let totals = aggregate.finalize();
        assert_eq!(totals.object_count(), 1);

        assert_eq!(
            aggregate.record_object(&object(1, StorageClass::Standard, None)),
            RecordOutcome::Sealed
        );
        assert_eq!(
            aggregate.merge(PartialAggregate::default()),
            RecordOutcome::Sealed
        );
        assert_eq!(aggregate.finalize().object_count(), 0);
    }

    #[test]
    fn test_should_merge_partials_like_direct_records() {
        let objects = [
            object(3, StorageClass::Standard, Some(10)),
            object(4, StorageClass::DeepArchive, Some(40)),
            object(5, StorageClass::Standard, Some(20)),
        ];
        let filter = FilterSettings::default();

        let direct = BucketAggregate::new("b", filter.clone());
        for o in &objects {
            direct.record_object(o);
        }

        let merged = BucketAggregate::new("b", filter.clone());
        for chunk in objects.chunks(2) {
            let mut partial = PartialAggregate::default();
            for o in chunk {
                partial.record_object(o, &filter);
            }
            merged.merge(partial);
        }

        assert_eq!(direct.finalize(), merged.finalize());
    }

    proptest! {
        #[test]
        fn test_should_not_lose_concurrent_updates(
            sizes in prop::collection::vec((0u64..1_000_000, 0usize..3), 1..200),
            threads in 1usize..8,
        ) {
            let classes = [StorageClass::Standard, StorageClass::Glacier, StorageClass::StandardIa];
            let objects: Vec<ObjectSummary> = sizes
                .iter()
                .map(|&(size, class)| object(size, classes[class].clone(), Some(i64::try_from(size).unwrap())))
                .collect();

            let aggregate = BucketAggregate::new("b", FilterSettings::default());
            let chunk = objects.len().div_ceil(threads);
            std::thread::scope(|scope| {
                for part in objects.chunks(chunk) {
                    let aggregate = &aggregate;
                    scope.spawn(move || {
                        for o in part {
                            aggregate.record_object(o);
                        }
                    });
                }
            });

            let mut sequential = PartialAggregate::default();
            for o in &objects {
                sequential.record_object(o, &FilterSettings::default());
            }
            prop_assert_eq!(aggregate.finalize(), sequential);
        }
    }
}
