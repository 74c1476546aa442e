//! AWS SDK listing backend.
//!
//! [`AwsLister`] lists buckets through `ListBuckets` (server-side prefix
//! filter, continuation tokens, and the `BucketRegion` of each bucket) and
//! objects through `ListObjectsV2`. Object listings are sent to a client
//! pinned to the bucket's region; those clients are built lazily and cached.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use s3cost_core::StorageClass;
use tracing::debug;

use crate::error::ListingError;
use crate::source::{BucketLister, BucketSummary, ObjectLister, ObjectSummary, Page};

/// Region reported for buckets whose listing carries no region.
const LEGACY_DEFAULT_REGION: &str = "us-east-1";

/// Listing backend over `aws-sdk-s3`.
#[derive(Debug)]
pub struct AwsLister {
    sdk_config: SdkConfig,
    endpoint_url: Option<String>,
    client: Client,
    regional: Mutex<HashMap<String, Client>>,
}

impl AwsLister {
    /// Build a lister from the default AWS credential and region chain.
    ///
    /// When `endpoint_url` is set, every request goes to that endpoint with
    /// path-style addressing (S3-compatible servers).
    pub async fn from_env(endpoint_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_sdk_config(sdk_config, endpoint_url)
    }

    /// Build a lister from an existing SDK configuration.
    #[must_use]
    pub fn from_sdk_config(sdk_config: SdkConfig, endpoint_url: Option<String>) -> Self {
        let client = Client::from_conf(Self::client_builder(&sdk_config, endpoint_url.as_deref()).build());
        Self {
            sdk_config,
            endpoint_url,
            client,
            regional: Mutex::new(HashMap::new()),
        }
    }

    fn client_builder(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> aws_sdk_s3::config::Builder {
        let builder = aws_sdk_s3::config::Builder::from(sdk_config);
        match endpoint_url {
            Some(url) => builder.endpoint_url(url).force_path_style(true),
            None => builder,
        }
    }

    fn client_for(&self, region: &str) -> Client {
        let mut regional = self.regional.lock();
        regional
            .entry(region.to_owned())
            .or_insert_with(|| {
                debug!(region, "creating regional S3 client");
                let config = Self::client_builder(&self.sdk_config, self.endpoint_url.as_deref())
                    .region(Region::new(region.to_owned()))
                    .build();
                Client::from_conf(config)
            })
            .clone()
    }
}

fn to_chrono(time: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

#[async_trait]
impl BucketLister for AwsLister {
    async fn list_buckets(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<Page<BucketSummary>, ListingError> {
        let mut request = self.client.list_buckets().set_continuation_token(continuation);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        let output = request
            .send()
            .await
            .map_err(|e| ListingError::new("ListBuckets", DisplayErrorContext(&e).to_string()))?;

        let items = output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                let name = bucket.name()?;
                Some(BucketSummary::new(
                    name,
                    bucket.bucket_region().unwrap_or(LEGACY_DEFAULT_REGION),
                    bucket.creation_date().and_then(to_chrono),
                ))
            })
            .collect();

        Ok(Page {
            items,
            next: output.continuation_token().map(ToOwned::to_owned),
        })
    }
}

#[async_trait]
impl ObjectLister for AwsLister {
    async fn list_objects(
        &self,
        bucket: &BucketSummary,
        continuation: Option<String>,
    ) -> Result<Page<ObjectSummary>, ListingError> {
        let output = self
            .client_for(&bucket.region)
            .list_objects_v2()
            .bucket(&bucket.name)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| {
                ListingError::new("ListObjectsV2", DisplayErrorContext(&e).to_string())
            })?;

        let items = output
            .contents()
            .iter()
            .map(|object| ObjectSummary {
                key: object.key().unwrap_or_default().to_owned(),
                size_bytes: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                last_modified: object.last_modified().and_then(to_chrono),
                storage_class: StorageClass::from_listing(
                    object.storage_class().map_or("", |c| c.as_str()),
                ),
            })
            .collect();

        let next = if output.is_truncated() == Some(true) {
            output.next_continuation_token().map(ToOwned::to_owned)
        } else {
            None
        };

        Ok(Page { items, next })
    }
}
