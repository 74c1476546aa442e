//! Integration tests for s3cost.
//!
//! These tests require an S3-compatible server at `localhost:4566`
//! (override with `S3_ENDPOINT_URL`). They are marked `#[ignore]` so they
//! don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p s3cost-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::StorageClass as S3StorageClass;
use s3cost_scanner::AwsLister;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

fn credentials() -> Credentials {
    Credentials::new("test", "test", None, None, "integration-test")
}

/// Create a configured S3 client pointing at the local server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials())
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Create an [`AwsLister`] pointing at the local server.
pub async fn aws_lister() -> AwsLister {
    init_tracing();

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials())
        .load()
        .await;

    AwsLister::from_sdk_config(sdk_config, Some(endpoint_url()))
}

/// Generate a unique prefix shared by the buckets of one test.
#[must_use]
pub fn test_prefix(name: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("s3cost-{name}-{id}-")
}

/// Create a bucket. Caller is responsible for cleanup.
pub async fn create_bucket(client: &aws_sdk_s3::Client, name: &str) {
    client
        .create_bucket()
        .bucket(name)
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
}

/// Upload `count` objects of `size` bytes with the given storage class.
pub async fn put_objects(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    count: usize,
    size: usize,
    storage_class: S3StorageClass,
) {
    for i in 0..count {
        let key = format!("{}/obj-{i}", storage_class.as_str());
        client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .storage_class(storage_class.clone())
            .body(ByteStream::from(vec![b'x'; size]))
            .send()
            .await
            .unwrap_or_else(|e| panic!("put {bucket}/{key}: {e}"));
    }
}

/// Delete all objects in a bucket, then delete the bucket.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let mut continuation_token = None;
    loop {
        let mut req = client.list_objects_v2().bucket(bucket);
        if let Some(token) = continuation_token.take() {
            req = req.continuation_token(token);
        }
        let Ok(resp) = req.send().await else {
            return; // Bucket may not exist.
        };

        for obj in resp.contents() {
            if let Some(key) = obj.key() {
                let _ = client.delete_object().bucket(bucket).key(key).send().await;
            }
        }

        if resp.is_truncated() == Some(true) {
            continuation_token = resp.next_continuation_token().map(ToOwned::to_owned);
        } else {
            break;
        }
    }

    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_listing;
mod test_scan;
