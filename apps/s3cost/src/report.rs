//! Report rendering.

use std::collections::BTreeMap;
use std::io::{self, Write};

use s3cost_core::{DisplaySettings, GroupBy, format_cost, format_file_size};
use s3cost_pricing::round_cents;
use s3cost_scanner::{Bucket, ScanReport, ScanStats};
use serde::Serialize;

/// Totals of a group of buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Totals {
    buckets: usize,
    objects: u64,
    size_bytes: u64,
    cost: f64,
}

impl Totals {
    fn of<'a>(buckets: impl IntoIterator<Item = &'a Bucket>) -> Self {
        let mut totals = buckets.into_iter().fold(Self::default(), |mut t, b| {
            t.buckets += 1;
            t.objects += b.object_count;
            t.size_bytes += b.total_size;
            t.cost += b.cost.unwrap_or(0.0);
            t
        });
        totals.cost = round_cents(totals.cost);
        totals
    }

    fn of_report(report: &ScanReport) -> Self {
        Self {
            buckets: report.buckets.len(),
            objects: report.total_objects(),
            size_bytes: report.total_size(),
            cost: report.total_cost(),
        }
    }

    fn line(&self, label: &str, display: &DisplaySettings) -> String {
        format!(
            "{label}: {} buckets, {} files, {}, {}",
            self.buckets,
            self.objects,
            format_file_size(self.size_bytes, display.file_size),
            format_cost(self.cost)
        )
    }
}

fn sorted_by_name(report: &ScanReport) -> Vec<&Bucket> {
    let mut buckets: Vec<&Bucket> = report.buckets.iter().collect();
    buckets.sort_by(|a, b| a.name.cmp(&b.name));
    buckets
}

fn write_bucket(out: &mut impl Write, bucket: &Bucket, display: &DisplaySettings) -> io::Result<()> {
    let timestamp = |t: Option<_>| t.map_or_else(|| "-".to_owned(), |t| display.timezone.format(t));

    writeln!(out, "Name: {}", bucket.name)?;
    writeln!(out, "  - Region: {}", bucket.region)?;
    writeln!(out, "  - CreationDate: {}", timestamp(bucket.creation_date))?;
    writeln!(out, "  - Number of files: {}", bucket.object_count)?;
    writeln!(
        out,
        "  - Total size: {}",
        format_file_size(bucket.total_size, display.file_size)
    )?;
    writeln!(
        out,
        "  - Most recent modified date: {}",
        timestamp(bucket.most_recent_modified)
    )?;
    match (&bucket.cost, &bucket.cost_error) {
        (Some(cost), _) => writeln!(out, "  - Cost: {}", format_cost(*cost))?,
        (None, Some(error)) => writeln!(out, "  - Cost: unavailable ({error})")?,
        (None, None) => writeln!(out, "  - Cost: unavailable")?,
    }
    for (class, usage) in &bucket.classes {
        let cost = usage.cost.map_or_else(|| "-".to_owned(), format_cost);
        writeln!(
            out,
            "    - {class}: {} files, {}, {cost}",
            usage.object_count,
            format_file_size(usage.size_bytes, display.file_size)
        )?;
    }
    Ok(())
}

/// Write the text report.
///
/// Buckets are listed by name, or under `Region:` headers with a subtotal
/// per region when grouping by region. A total line closes the report.
pub fn write_text(out: &mut impl Write, report: &ScanReport, display: &DisplaySettings) -> io::Result<()> {
    let buckets = sorted_by_name(report);

    match display.group_by {
        GroupBy::Region => {
            let mut regions: BTreeMap<&str, Vec<&Bucket>> = BTreeMap::new();
            for &bucket in &buckets {
                regions.entry(bucket.region.as_str()).or_default().push(bucket);
            }
            for (region, members) in regions {
                writeln!(out, "Region: {region}")?;
                for bucket in &members {
                    write_bucket(out, bucket, display)?;
                }
                writeln!(out, "{}", Totals::of(members).line("Subtotal", display))?;
                writeln!(out)?;
            }
        }
        GroupBy::None | GroupBy::Bucket => {
            for bucket in &buckets {
                write_bucket(out, bucket, display)?;
            }
        }
    }

    writeln!(out, "{}", Totals::of_report(report).line("Total", display))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    buckets: Vec<&'a Bucket>,
    regions: BTreeMap<&'a str, Totals>,
    totals: Totals,
    stats: &'a ScanStats,
}

/// Write the report as a JSON document.
pub fn write_json(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    let buckets = sorted_by_name(report);
    let mut by_region: BTreeMap<&str, Vec<&Bucket>> = BTreeMap::new();
    for &bucket in &buckets {
        by_region.entry(bucket.region.as_str()).or_default().push(bucket);
    }

    let document = JsonReport {
        regions: by_region
            .into_iter()
            .map(|(region, members)| (region, Totals::of(members)))
            .collect(),
        totals: Totals::of_report(report),
        buckets,
        stats: &report.stats,
    };
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}
