//! Command-line arguments.
//!
//! Flags override the environment-derived [`ScanConfig`]; anything not given
//! on the command line keeps its `S3COST_*` / `LOG_LEVEL` value.

use clap::{Parser, ValueEnum};
use s3cost_core::{ConfigResult, ScanConfig};
use s3cost_scanner::AggregationMode;

/// Inventory S3 buckets and estimate their monthly storage cost.
///
/// ## Examples
///
/// All buckets, sizes in GB, grouped by region:
///   s3cost --file-size GB --group-by region
///
/// Only GLACIER objects of buckets starting with `logs-`:
///   s3cost --filters "filters:bucket;logs-;storage-type;GLACIER"
#[derive(Parser, Debug)]
#[command(name = "s3cost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Unit for sizes: B, KB, MB, GB or TB [env: S3COST_FILE_SIZE]
    #[arg(long)]
    pub file_size: Option<String>,

    /// Group buckets by `region` or list them by `bucket` [env: S3COST_GROUP_BY]
    #[arg(long)]
    pub group_by: Option<String>,

    /// IANA time zone for timestamps, or `Local` [env: S3COST_TIMEZONE]
    #[arg(long)]
    pub timezone: Option<String>,

    /// Combined filter, e.g. "filters:bucket;<prefix>;storage-type;<CLASS>"
    #[arg(long)]
    pub filters: Option<String>,

    /// Only scan buckets whose name starts with this prefix [env: S3COST_BUCKET_PREFIX]
    #[arg(long)]
    pub bucket_prefix: Option<String>,

    /// Only count objects of this storage class [env: S3COST_STORAGE_CLASS]
    #[arg(long)]
    pub storage_class: Option<String>,

    /// Custom S3 endpoint URL (S3-compatible servers) [env: S3COST_ENDPOINT_URL]
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// `fail-fast` or `report-per-bucket` [env: S3COST_FAILURE_POLICY]
    #[arg(long)]
    pub failure_policy: Option<String>,

    /// Log level filter [env: LOG_LEVEL]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Aggregate each object page separately and merge after the join
    #[arg(long)]
    pub merge_pages: bool,
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON document.
    Json,
}

impl Cli {
    /// Apply the flags on top of `config`.
    ///
    /// `--filters` is applied before `--bucket-prefix` / `--storage-class`,
    /// so the individual flags win.
    pub fn apply(&self, config: &mut ScanConfig) -> ConfigResult<()> {
        if let Some(expression) = &self.filters {
            config.apply_filter_expression(expression)?;
        }

        for (flag, target) in [
            (&self.bucket_prefix, &mut config.bucket_prefix),
            (&self.storage_class, &mut config.storage_class),
            (&self.file_size, &mut config.file_size),
            (&self.group_by, &mut config.group_by),
            (&self.timezone, &mut config.timezone),
            (&self.failure_policy, &mut config.failure_policy),
            (&self.log_level, &mut config.log_level),
        ] {
            if let Some(value) = flag {
                target.clone_from(value);
            }
        }

        if let Some(url) = &self.endpoint_url {
            config.endpoint_url = Some(url.clone()).filter(|u| !u.is_empty());
        }

        Ok(())
    }

    /// Aggregation mode selected by `--merge-pages`.
    #[must_use]
    pub fn aggregation_mode(&self) -> AggregationMode {
        if self.merge_pages {
            AggregationMode::Merge
        } else {
            AggregationMode::Locked
        }
    }
}
