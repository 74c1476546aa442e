//! Human-readable formatting of sizes and costs.

use crate::types::FileSizeUnit;

/// Format a byte count in the given unit.
///
/// Bytes are printed as an integer, every other unit with two decimals.
///
/// # Examples
///
/// ```
/// use s3cost_core::{FileSizeUnit, format_file_size};
///
/// assert_eq!(format_file_size(1, FileSizeUnit::B), "1 bytes");
/// assert_eq!(format_file_size(1024, FileSizeUnit::KB), "1.00 KB");
/// assert_eq!(format_file_size(1_572_864, FileSizeUnit::MB), "1.50 MB");
/// assert_eq!(format_file_size(95, FileSizeUnit::from_code(10)), "95 bytes");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(size: u64, unit: FileSizeUnit) -> String {
    match unit {
        FileSizeUnit::B => format!("{size} bytes"),
        unit => format!("{:.2} {unit}", size as f64 / unit.divisor() as f64),
    }
}

/// Format a USD amount with two decimals (e.g. `$1.01`).
#[must_use]
pub fn format_cost(amount: f64) -> String {
    format!("${amount:.2}")
}
