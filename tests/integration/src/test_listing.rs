//! AWS lister integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::StorageClass as S3StorageClass;
    use s3cost_core::StorageClass;
    use s3cost_scanner::{BucketLister, ObjectLister};

    use crate::{aws_lister, cleanup_bucket, create_bucket, put_objects, s3_client, test_prefix};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_buckets_by_prefix() {
        let client = s3_client();
        let prefix = test_prefix("buckets");
        let names = [format!("{prefix}a"), format!("{prefix}b")];
        for name in &names {
            create_bucket(&client, name).await;
        }

        let lister = aws_lister().await;
        let mut found = Vec::new();
        let mut token = None;
        loop {
            let page = lister.list_buckets(&prefix, token).await.expect("list buckets");
            found.extend(
                page.items
                    .into_iter()
                    .filter(|b| b.name.starts_with(&prefix))
                    .map(|b| b.name),
            );
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        found.sort();
        assert_eq!(found, names);

        for name in &names {
            cleanup_bucket(&client, name).await;
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_objects_with_storage_class() {
        let client = s3_client();
        let prefix = test_prefix("objects");
        let bucket = format!("{prefix}data");
        create_bucket(&client, &bucket).await;
        put_objects(&client, &bucket, 2, 10, S3StorageClass::Standard).await;
        put_objects(&client, &bucket, 1, 20, S3StorageClass::Glacier).await;

        let lister = aws_lister().await;
        let summary = lister
            .list_buckets(&prefix, None)
            .await
            .expect("list buckets")
            .items
            .into_iter()
            .find(|b| b.name == bucket)
            .expect("bucket listed");
        let page = lister.list_objects(&summary, None).await.expect("list objects");

        assert_eq!(page.items.len(), 3);
        assert!(page.next.is_none());
        let glacier: Vec<_> = page
            .items
            .iter()
            .filter(|o| o.storage_class == StorageClass::Glacier)
            .collect();
        assert_eq!(glacier.len(), 1);
        assert_eq!(glacier[0].size_bytes, 20);
        assert!(page.items.iter().all(|o| o.last_modified.is_some()));

        cleanup_bucket(&client, &bucket).await;
    }
}
