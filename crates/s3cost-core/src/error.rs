//! Error types for the s3cost core.

/// Configuration error, raised before any scanning starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Unrecognized file size unit. Carries the upper-cased input.
    #[error("invalid unit {0}")]
    InvalidUnit(String),

    /// Unrecognized group-by option.
    #[error("invalid group by option {0:?}, please use 'region' or 'bucket'")]
    InvalidGroupBy(String),

    /// Unknown IANA time zone name.
    #[error("invalid timezone {0:?}")]
    InvalidTimezone(String),

    /// Storage-class filter that is not one of the known storage classes.
    #[error("invalid storage class filter {0:?}")]
    InvalidStorageClass(String),

    /// Malformed `--filters` expression.
    #[error("invalid filter option {0:?}: {1}")]
    InvalidFilter(String, &'static str),

    /// Unrecognized failure policy.
    #[error("invalid failure policy {0:?}, please use 'fail-fast' or 'report-per-bucket'")]
    InvalidFailurePolicy(String),
}

/// Convenience result type for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;
