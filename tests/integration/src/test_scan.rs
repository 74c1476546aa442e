//! End-to-end scan integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_s3::types::StorageClass as S3StorageClass;
    use s3cost_core::{ScanConfig, StorageClass};
    use s3cost_scanner::{ScanOrchestrator, ScanPhase};

    use crate::{aws_lister, cleanup_bucket, create_bucket, put_objects, s3_client, test_prefix};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_scan_prefixed_buckets() {
        let client = s3_client();
        let prefix = test_prefix("scan");
        let hot = format!("{prefix}hot");
        let cold = format!("{prefix}cold");
        create_bucket(&client, &hot).await;
        create_bucket(&client, &cold).await;
        put_objects(&client, &hot, 3, 100, S3StorageClass::Standard).await;
        put_objects(&client, &cold, 2, 50, S3StorageClass::Standard).await;
        put_objects(&client, &cold, 2, 70, S3StorageClass::DeepArchive).await;

        let settings = ScanConfig::builder()
            .bucket_prefix(prefix.clone())
            .build()
            .validate()
            .expect("valid config");
        let lister = Arc::new(aws_lister().await);
        let scan = ScanOrchestrator::new(lister.clone(), lister, &settings);
        let report = scan.run().await.expect("scan");

        assert_eq!(scan.phase(), ScanPhase::Done);
        assert_eq!(report.buckets.len(), 2);
        let cold_bucket = report.buckets.iter().find(|b| b.name == cold).expect("cold bucket");
        assert_eq!(cold_bucket.object_count, 4);
        assert_eq!(cold_bucket.total_size, 240);
        assert_eq!(cold_bucket.classes[&StorageClass::DeepArchive].size_bytes, 140);
        assert_eq!(cold_bucket.cost, Some(0.0));

        cleanup_bucket(&client, &hot).await;
        cleanup_bucket(&client, &cold).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_exclude_buckets_without_filtered_class() {
        let client = s3_client();
        let prefix = test_prefix("filter");
        let plain = format!("{prefix}plain");
        let archive = format!("{prefix}archive");
        create_bucket(&client, &plain).await;
        create_bucket(&client, &archive).await;
        put_objects(&client, &plain, 2, 10, S3StorageClass::Standard).await;
        put_objects(&client, &archive, 1, 10, S3StorageClass::Standard).await;
        put_objects(&client, &archive, 1, 30, S3StorageClass::Glacier).await;

        let settings = ScanConfig::builder()
            .bucket_prefix(prefix.clone())
            .storage_class("GLACIER".into())
            .build()
            .validate()
            .expect("valid config");
        let lister = Arc::new(aws_lister().await);
        let report = ScanOrchestrator::new(lister.clone(), lister, &settings)
            .run()
            .await
            .expect("scan");

        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].name, archive);
        assert_eq!(report.buckets[0].object_count, 1);
        assert_eq!(report.buckets[0].total_size, 30);
        assert_eq!(report.stats.buckets_excluded, 1);

        cleanup_bucket(&client, &plain).await;
        cleanup_bucket(&client, &archive).await;
    }
}
