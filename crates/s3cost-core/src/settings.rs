//! Validated filter and display settings.
//!
//! These are produced by [`crate::ScanConfig::validate`] and consumed by the
//! scanner (filters) and the report renderer (display).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::types::{FailurePolicy, FileSizeUnit, GroupBy, StorageClass};

/// Timestamp layout used in reports.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Which buckets and objects a scan takes into account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSettings {
    /// Only buckets whose name starts with this prefix are listed.
    pub bucket_prefix: String,
    /// When set, only objects of this storage class are counted and buckets
    /// without any such object are left out of the report.
    pub storage_class: Option<StorageClass>,
}

impl FilterSettings {
    /// Whether an object of `class` is counted under this filter.
    #[must_use]
    pub fn admits(&self, class: &StorageClass) -> bool {
        self.storage_class.as_ref().is_none_or(|wanted| wanted == class)
    }

    /// Whether a storage-class filter is active.
    #[must_use]
    pub fn filters_storage_class(&self) -> bool {
        self.storage_class.is_some()
    }
}

/// Time zone used to render timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayTimezone {
    /// The local time zone of the machine running the scan.
    #[default]
    Local,
    /// A named IANA time zone (e.g. `Europe/Paris`, `UTC`).
    Named(Tz),
}

impl DisplayTimezone {
    /// Render a UTC timestamp in this time zone.
    #[must_use]
    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Local => timestamp
                .with_timezone(&Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            Self::Named(tz) => timestamp
                .with_timezone(tz)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        }
    }
}

impl fmt::Display for DisplayTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for DisplayTimezone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        s.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ConfigError::InvalidTimezone(s.to_owned()))
    }
}

/// How the report renders buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    /// Unit used for sizes.
    pub file_size: FileSizeUnit,
    /// Grouping of buckets in the report.
    pub group_by: GroupBy,
    /// Time zone used for timestamps.
    pub timezone: DisplayTimezone,
}

/// Everything a run needs once the raw configuration has been validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSettings {
    /// Bucket and storage-class filters.
    pub filter: FilterSettings,
    /// Report display options.
    pub display: DisplaySettings,
    /// Reaction to per-bucket pricing failures.
    pub failure_policy: FailurePolicy,
}
