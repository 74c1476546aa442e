//! Common type definitions shared across the s3cost crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// StorageClass
// ---------------------------------------------------------------------------

/// S3 storage class of an object.
///
/// The eleven named variants are the classes s3cost knows how to price (or
/// knows to be free). Anything else reported by a listing is carried through
/// as [`StorageClass::Other`] so that it can still be counted; pricing such a
/// class fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StorageClass {
    /// `STANDARD`
    #[default]
    Standard,
    /// `REDUCED_REDUNDANCY`
    ReducedRedundancy,
    /// `GLACIER` (Glacier Flexible Retrieval)
    Glacier,
    /// `GLACIER_IR` (Glacier Instant Retrieval)
    GlacierIr,
    /// `DEEP_ARCHIVE`
    DeepArchive,
    /// `STANDARD_IA`
    StandardIa,
    /// `ONEZONE_IA`
    OnezoneIa,
    /// `INTELLIGENT_TIERING`
    IntelligentTiering,
    /// `OUTPOSTS`
    Outposts,
    /// `SNOW`
    Snow,
    /// `EXPRESS_ONEZONE`
    ExpressOnezone,
    /// A storage class token s3cost does not know about.
    Other(String),
}

impl StorageClass {
    /// Every storage class s3cost recognizes, in report order.
    pub const KNOWN: [Self; 11] = [
        Self::Standard,
        Self::ReducedRedundancy,
        Self::Glacier,
        Self::GlacierIr,
        Self::DeepArchive,
        Self::StandardIa,
        Self::OnezoneIa,
        Self::IntelligentTiering,
        Self::Outposts,
        Self::Snow,
        Self::ExpressOnezone,
    ];

    /// Returns the wire token of this storage class.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "STANDARD",
            Self::ReducedRedundancy => "REDUCED_REDUNDANCY",
            Self::Glacier => "GLACIER",
            Self::GlacierIr => "GLACIER_IR",
            Self::DeepArchive => "DEEP_ARCHIVE",
            Self::StandardIa => "STANDARD_IA",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::Outposts => "OUTPOSTS",
            Self::Snow => "SNOW",
            Self::ExpressOnezone => "EXPRESS_ONEZONE",
            Self::Other(token) => token,
        }
    }

    /// Whether this is one of the [`StorageClass::KNOWN`] classes.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Map a token reported by a listing to a storage class.
    ///
    /// Never fails: unknown tokens become [`StorageClass::Other`]. An empty
    /// token is treated as `STANDARD`, which is what S3 omits the field for.
    #[must_use]
    pub fn from_listing(token: &str) -> Self {
        if token.is_empty() {
            return Self::Standard;
        }
        Self::KNOWN
            .into_iter()
            .find(|class| class.as_str() == token)
            .unwrap_or_else(|| Self::Other(token.to_owned()))
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse used for user-supplied filters: only known classes are accepted.
impl FromStr for StorageClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::KNOWN
            .into_iter()
            .find(|class| class.as_str() == upper)
            .ok_or_else(|| ConfigError::InvalidStorageClass(s.to_owned()))
    }
}

impl From<String> for StorageClass {
    fn from(token: String) -> Self {
        Self::from_listing(&token)
    }
}

impl From<StorageClass> for String {
    fn from(class: StorageClass) -> Self {
        match class {
            StorageClass::Other(token) => token,
            known => known.as_str().to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// FileSizeUnit
// ---------------------------------------------------------------------------

/// Unit used when rendering byte sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileSizeUnit {
    /// Plain bytes.
    #[default]
    B,
    /// Kibibytes (1024 bytes).
    KB,
    /// Mebibytes.
    MB,
    /// Gibibytes.
    GB,
    /// Tebibytes.
    TB,
}

impl FileSizeUnit {
    /// Numeric code of the unit (`B` = 0 through `TB` = 4).
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::B => 0,
            Self::KB => 1,
            Self::MB => 2,
            Self::GB => 3,
            Self::TB => 4,
        }
    }

    /// Unit for a numeric code; out-of-range codes fall back to bytes.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::KB,
            2 => Self::MB,
            3 => Self::GB,
            4 => Self::TB,
            _ => Self::B,
        }
    }

    /// Number of bytes in one unit.
    #[must_use]
    pub fn divisor(self) -> u64 {
        1u64 << (10 * u32::from(self.code()))
    }

    /// Returns the unit label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B => "B",
            Self::KB => "KB",
            Self::MB => "MB",
            Self::GB => "GB",
            Self::TB => "TB",
        }
    }
}

impl fmt::Display for FileSizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `"kb"`, `"KB"` and `"Kb"` all parse to [`FileSizeUnit::KB`].
impl FromStr for FileSizeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "B" => Ok(Self::B),
            "KB" => Ok(Self::KB),
            "MB" => Ok(Self::MB),
            "GB" => Ok(Self::GB),
            "TB" => Ok(Self::TB),
            _ => Err(ConfigError::InvalidUnit(upper)),
        }
    }
}

// ---------------------------------------------------------------------------
// GroupBy
// ---------------------------------------------------------------------------

/// How the report groups buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// No grouping, one entry per bucket.
    #[default]
    None,
    /// Group buckets under their region with per-region subtotals.
    Region,
    /// One entry per bucket, ordered by bucket name.
    Bucket,
}

impl FromStr for GroupBy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "region" => Ok(Self::Region),
            "bucket" => Ok(Self::Bucket),
            other => Err(ConfigError::InvalidGroupBy(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// FailurePolicy
// ---------------------------------------------------------------------------

/// What a scan does when a bucket's cost cannot be priced.
///
/// Listing failures abort the run under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first pricing error.
    #[default]
    FailFast,
    /// Keep the bucket in the report with the pricing error attached.
    ReportPerBucket,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(Self::FailFast),
            "report-per-bucket" => Ok(Self::ReportPerBucket),
            other => Err(ConfigError::InvalidFailurePolicy(other.to_owned())),
        }
    }
}
