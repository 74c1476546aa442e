//! Scan configuration.
//!
//! Provides [`ScanConfig`], the raw (unvalidated) configuration of a run.
//! Values come from environment variables, the command line, or the
//! builder; [`ScanConfig::validate`] turns them into [`ScanSettings`] before
//! any listing call is made.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::settings::{DisplaySettings, FilterSettings, ScanSettings};

/// Raw s3cost configuration.
///
/// # Examples
///
/// ```
/// use s3cost_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.file_size, "B");
/// assert!(config.storage_class.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Only buckets whose name starts with this prefix are scanned.
    #[builder(default)]
    pub bucket_prefix: String,

    /// Storage-class filter; empty means every class is counted.
    #[builder(default)]
    pub storage_class: String,

    /// Unit for rendered sizes (`B`, `KB`, `MB`, `GB`, `TB`).
    #[builder(default = String::from("B"))]
    pub file_size: String,

    /// Report grouping (`""`, `"region"` or `"bucket"`).
    #[builder(default)]
    pub group_by: String,

    /// IANA time zone for timestamps, or `Local`.
    #[builder(default = String::from("Local"))]
    pub timezone: String,

    /// Custom S3 endpoint (for S3-compatible servers).
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// `fail-fast` or `report-per-bucket`.
    #[builder(default = String::from("fail-fast"))]
    pub failure_policy: String,

    /// Log level filter string (e.g. `"warn"`, `"debug"`).
    #[builder(default = String::from("warn"))]
    pub log_level: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bucket_prefix: String::new(),
            storage_class: String::new(),
            file_size: String::from("B"),
            group_by: String::new(),
            timezone: String::from("Local"),
            endpoint_url: None,
            failure_policy: String::from("fail-fast"),
            log_level: String::from("warn"),
        }
    }
}

impl ScanConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3COST_BUCKET_PREFIX` | *(empty)* |
    /// | `S3COST_STORAGE_CLASS` | *(empty)* |
    /// | `S3COST_FILE_SIZE` | `B` |
    /// | `S3COST_GROUP_BY` | *(empty)* |
    /// | `S3COST_TIMEZONE` | `Local` |
    /// | `S3COST_ENDPOINT_URL` | *(unset)* |
    /// | `S3COST_FAILURE_POLICY` | `fail-fast` |
    /// | `LOG_LEVEL` | `warn` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Unset variables keep their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("S3COST_BUCKET_PREFIX") {
            config.bucket_prefix = v;
        }
        if let Some(v) = lookup("S3COST_STORAGE_CLASS") {
            config.storage_class = v;
        }
        if let Some(v) = lookup("S3COST_FILE_SIZE") {
            config.file_size = v;
        }
        if let Some(v) = lookup("S3COST_GROUP_BY") {
            config.group_by = v;
        }
        if let Some(v) = lookup("S3COST_TIMEZONE") {
            config.timezone = v;
        }
        if let Some(v) = lookup("S3COST_ENDPOINT_URL") {
            if !v.is_empty() {
                config.endpoint_url = Some(v);
            }
        }
        if let Some(v) = lookup("S3COST_FAILURE_POLICY") {
            config.failure_policy = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Apply a `--filters` expression of the form
    /// `filters:bucket;<prefix>;storage-type;<CLASS>`.
    ///
    /// Either pair may be omitted; values that are present override the
    /// current prefix / storage class.
    pub fn apply_filter_expression(&mut self, expression: &str) -> ConfigResult<()> {
        let Some((_, body)) = expression
            .split_once(':')
            .filter(|(_, body)| !body.contains(':'))
        else {
            return Err(ConfigError::InvalidFilter(
                expression.to_owned(),
                "use 'bucket' or 'storage-type' and the value separated by a colon",
            ));
        };

        let parts: Vec<&str> = body.split(';').collect();
        for (key, target) in [
            ("bucket", &mut self.bucket_prefix),
            ("storage-type", &mut self.storage_class),
        ] {
            if let Some(index) = parts.iter().position(|p| *p == key) {
                let value = parts.get(index + 1).ok_or_else(|| {
                    ConfigError::InvalidFilter(
                        expression.to_owned(),
                        "filter key is missing its value",
                    )
                })?;
                *target = (*value).to_owned();
            }
        }

        Ok(())
    }

    /// Validate the raw values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; nothing is scanned when
    /// validation fails.
    pub fn validate(&self) -> ConfigResult<ScanSettings> {
        let storage_class = if self.storage_class.is_empty() {
            None
        } else {
            Some(self.storage_class.parse()?)
        };

        Ok(ScanSettings {
            filter: FilterSettings {
                bucket_prefix: self.bucket_prefix.clone(),
                storage_class,
            },
            display: DisplaySettings {
                file_size: self.file_size.parse()?,
                group_by: self.group_by.parse()?,
                timezone: self.timezone.parse()?,
            },
            failure_policy: self.failure_policy.parse()?,
        })
    }
}
