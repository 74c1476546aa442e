//! s3cost - S3 bucket inventory and storage cost report.
//!
//! Lists every bucket visible to the configured AWS credentials, walks their
//! objects concurrently, and prints per-bucket totals with a tiered monthly
//! storage cost estimate.
//!
//! # Usage
//!
//! ```text
//! s3cost --file-size GB --group-by region --timezone Europe/Paris
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3COST_BUCKET_PREFIX` | *(empty)* | Bucket name prefix filter |
//! | `S3COST_STORAGE_CLASS` | *(empty)* | Storage class filter |
//! | `S3COST_FILE_SIZE` | `B` | Size unit |
//! | `S3COST_GROUP_BY` | *(empty)* | `region` or `bucket` |
//! | `S3COST_TIMEZONE` | `Local` | Time zone for timestamps |
//! | `S3COST_ENDPOINT_URL` | *(unset)* | Custom S3 endpoint |
//! | `S3COST_FAILURE_POLICY` | `fail-fast` | `fail-fast` or `report-per-bucket` |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! The report goes to stdout, logs go to stderr.

mod cli;
mod report;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use s3cost_core::ScanConfig;
use s3cost_pricing::CostCalculator;
use s3cost_scanner::{AwsLister, ScanOrchestrator};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, OutputFormat};

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Merge environment and command line into the raw configuration.
fn load_config(cli: &Cli) -> Result<ScanConfig> {
    apply_cli(ScanConfig::from_env(), cli)
}

/// Apply command-line overrides on top of `config`.
fn apply_cli(mut config: ScanConfig, cli: &Cli) -> Result<ScanConfig> {
    cli.apply(&mut config).context("invalid command line arguments")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_tracing(&config.log_level)?;

    let settings = config.validate().context("invalid configuration")?;

    info!(
        bucket_prefix = %settings.filter.bucket_prefix,
        storage_class = ?settings.filter.storage_class,
        endpoint_url = ?config.endpoint_url,
        failure_policy = ?settings.failure_policy,
        version = VERSION,
        "starting s3cost scan",
    );

    let lister = Arc::new(AwsLister::from_env(config.endpoint_url.clone()).await);
    let scan = ScanOrchestrator::with_options(
        lister.clone(),
        lister,
        &settings,
        CostCalculator::default(),
        cli.aggregation_mode(),
    );

    let report = tokio::select! {
        result = scan.run() => result.context("scan failed")?,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("interrupted, no report produced"),
    };

    let mut out = std::io::stdout().lock();
    match cli.format {
        OutputFormat::Text => report::write_text(&mut out, &report, &settings.display),
        OutputFormat::Json => report::write_json(&mut out, &report),
    }
    .context("failed to write report")?;
    out.flush().context("failed to write report")?;

    Ok(())
}
