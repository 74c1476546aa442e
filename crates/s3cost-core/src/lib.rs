//! Core types, configuration, and formatting for s3cost.
//!
//! This crate holds the pieces shared by the pricing engine, the scanner and
//! the command-line front end: storage classes and display units, the raw
//! [`ScanConfig`] and its validated [`ScanSettings`], and the size/cost
//! formatters used by reports.

mod config;
mod error;
mod format;
mod settings;
mod types;

pub use config::ScanConfig;
pub use error::{ConfigError, ConfigResult};
pub use format::{format_cost, format_file_size};
pub use settings::{DisplaySettings, DisplayTimezone, FilterSettings, ScanSettings};
pub use types::{FailurePolicy, FileSizeUnit, GroupBy, StorageClass};
