//! S3 storage price data.
//!
//! A [`PricingTable`] maps `region -> storage class -> pricing`, where the
//! pricing of a class is either an ordered list of [`Tier`]s, free, or not
//! offered in that region. The AWS list prices ship as plain data
//! ([`REGION_RATES`]) and are turned into a table once, on first use.
//!
//! Tests and callers with negotiated prices can build their own table with
//! [`PricingTable::empty`] and [`PricingTable::with_class`].

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use s3cost_core::StorageClass;

use crate::error::PricingError;

/// Gigabytes per terabyte; tier breakpoints are normalized to GB.
pub const TB_IN_GB: u64 = 1024;

/// `STANDARD` breakpoints: first 50 GB, next 450 GB, over 500 GB.
pub const STANDARD_BREAKPOINTS_GB: [u64; 2] = [50, 500];

/// `REDUCED_REDUNDANCY` breakpoints: 1, 50, 500, 1000 and 5000 TB.
pub const REDUCED_REDUNDANCY_BREAKPOINTS_GB: [u64; 5] = [
    TB_IN_GB,
    50 * TB_IN_GB,
    500 * TB_IN_GB,
    1000 * TB_IN_GB,
    5000 * TB_IN_GB,
];

/// Classes whose storage is billed outside S3 list prices; priced at zero.
const FREE_CLASSES: [StorageClass; 3] = [
    StorageClass::IntelligentTiering,
    StorageClass::Outposts,
    StorageClass::Snow,
];

// ---------------------------------------------------------------------------
// Tier / ClassPricing / Schedule
// ---------------------------------------------------------------------------

/// One pricing tier: the GB range `[lower_gb, upper_gb)` billed at `rate`
/// USD per GB-month. The last tier of a schedule is open-ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    /// Inclusive lower bound, in GB.
    pub lower_gb: u64,
    /// Exclusive upper bound, in GB; `None` for the last tier.
    pub upper_gb: Option<u64>,
    /// USD per GB-month.
    pub rate: f64,
}

/// How one storage class is priced in one region.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassPricing {
    /// Billed by tier, in ascending order.
    Tiered(Vec<Tier>),
    /// Storage cost is defined as zero.
    Free,
    /// The class is not offered in the region.
    Unavailable,
}

impl ClassPricing {
    /// Build a tiered schedule from its breakpoints and one rate per tier.
    ///
    /// # Errors
    ///
    /// [`PricingError::InvalidSchedule`] unless the breakpoints are non-zero
    /// and strictly ascending, `rates` holds exactly one more entry than
    /// `breakpoints_gb`, and every rate is finite and non-negative.
    pub fn tiered(breakpoints_gb: &[u64], rates: &[f64]) -> Result<Self, PricingError> {
        if rates.len() != breakpoints_gb.len() + 1 {
            return Err(PricingError::InvalidSchedule(format!(
                "{} breakpoints need {} rates, got {}",
                breakpoints_gb.len(),
                breakpoints_gb.len() + 1,
                rates.len()
            )));
        }
        let mut previous = 0;
        for &breakpoint in breakpoints_gb {
            if breakpoint <= previous {
                return Err(PricingError::InvalidSchedule(format!(
                    "breakpoint {breakpoint} GB does not follow {previous} GB"
                )));
            }
            previous = breakpoint;
        }
        if let Some(rate) = rates.iter().find(|rate| !rate.is_finite() || **rate < 0.0) {
            return Err(PricingError::InvalidSchedule(format!("invalid rate {rate}")));
        }
        Ok(Self::Tiered(build_tiers(breakpoints_gb, rates)))
    }

    /// A single tier covering every size.
    #[must_use]
    pub fn flat(rate: f64) -> Self {
        Self::Tiered(vec![Tier {
            lower_gb: 0,
            upper_gb: None,
            rate,
        }])
    }
}

/// Zip breakpoints and rates into tiers. Callers guarantee the shape.
fn build_tiers(breakpoints_gb: &[u64], rates: &[f64]) -> Vec<Tier> {
    let lowers = std::iter::once(0).chain(breakpoints_gb.iter().copied());
    let uppers = breakpoints_gb
        .iter()
        .copied()
        .map(Some)
        .chain(std::iter::once(None));
    lowers
        .zip(uppers)
        .zip(rates)
        .map(|((lower_gb, upper_gb), &rate)| Tier {
            lower_gb,
            upper_gb,
            rate,
        })
        .collect()
}

/// Resolved pricing of a (region, storage class) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Schedule<'a> {
    /// Ordered tiers to bill against.
    Tiers(&'a [Tier]),
    /// The class is free.
    Free,
    /// The table has no data for the region; billed as zero.
    UnsupportedRegion,
}

// ---------------------------------------------------------------------------
// PricingTable
// ---------------------------------------------------------------------------

/// Immutable price lookup keyed by region and storage class.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    regions: HashMap<String, HashMap<StorageClass, ClassPricing>>,
}

static AWS_DEFAULT: LazyLock<Arc<PricingTable>> = LazyLock::new(|| {
    let table = REGION_RATES
        .iter()
        .flat_map(|rates| rates.regions.iter().map(move |region| (*region, rates)))
        .fold(PricingTable::empty(), |table, (region, rates)| {
            rates.apply(table, region)
        });
    Arc::new(table)
});

impl PricingTable {
    /// A table with no regions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// AWS S3 list prices, built once and shared.
    #[must_use]
    pub fn aws_default() -> Arc<Self> {
        Arc::clone(&AWS_DEFAULT)
    }

    /// Return a table with `pricing` set for `class` in `region`.
    #[must_use]
    pub fn with_class(
        mut self,
        region: impl Into<String>,
        class: StorageClass,
        pricing: ClassPricing,
    ) -> Self {
        self.regions
            .entry(region.into())
            .or_default()
            .insert(class, pricing);
        self
    }

    /// Whether the table has price data for `region`.
    #[must_use]
    pub fn supports_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    /// Resolve the schedule of `class` in `region`.
    ///
    /// # Errors
    ///
    /// - [`PricingError::UnknownStorageClass`] for classes outside
    ///   [`StorageClass::KNOWN`], whatever the region.
    /// - [`PricingError::RateUnavailable`] when the region has data but the
    ///   class is not offered there.
    pub fn schedule(&self, region: &str, class: &StorageClass) -> Result<Schedule<'_>, PricingError> {
        if !class.is_known() {
            return Err(PricingError::UnknownStorageClass(class.clone()));
        }
        let Some(classes) = self.regions.get(region) else {
            return Ok(Schedule::UnsupportedRegion);
        };
        match classes.get(class) {
            Some(ClassPricing::Tiered(tiers)) => Ok(Schedule::Tiers(tiers)),
            Some(ClassPricing::Free) => Ok(Schedule::Free),
            Some(ClassPricing::Unavailable) | None => Err(PricingError::RateUnavailable {
                region: region.to_owned(),
                storage_class: class.clone(),
            }),
        }
    }

    /// Per-GB multiplier of tier `tier` (zero-based) for `class` in `region`.
    ///
    /// Free classes and regions without data yield `0.0` for any tier.
    ///
    /// # Errors
    ///
    /// Everything [`PricingTable::schedule`] returns, plus
    /// [`PricingError::TierNotFound`] when the schedule is shorter than `tier`.
    pub fn lookup_multiplier(
        &self,
        region: &str,
        class: &StorageClass,
        tier: usize,
    ) -> Result<f64, PricingError> {
        match self.schedule(region, class)? {
            Schedule::Tiers(tiers) => {
                tiers
                    .get(tier)
                    .map(|t| t.rate)
                    .ok_or_else(|| PricingError::TierNotFound {
                        region: region.to_owned(),
                        storage_class: class.clone(),
                        tier,
                    })
            }
            Schedule::Free | Schedule::UnsupportedRegion => Ok(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AWS list prices
// ---------------------------------------------------------------------------

/// List prices shared by a group of regions, in USD per GB-month.
#[derive(Debug)]
pub struct RegionRates {
    /// Regions billed at these rates.
    pub regions: &'static [&'static str],
    /// `STANDARD` rates for the three tiers of [`STANDARD_BREAKPOINTS_GB`].
    pub standard: [f64; 3],
    /// `REDUCED_REDUNDANCY` rates for the six tiers of
    /// [`REDUCED_REDUNDANCY_BREAKPOINTS_GB`].
    pub reduced_redundancy: [f64; 6],
    /// `STANDARD_IA` flat rate.
    pub standard_ia: f64,
    /// `GLACIER` flat rate.
    pub glacier: f64,
    /// `GLACIER_IR` flat rate.
    pub glacier_ir: f64,
    /// `DEEP_ARCHIVE` flat rate.
    pub deep_archive: f64,
    /// `EXPRESS_ONEZONE` flat rate; `None` where the class is not offered.
    pub express_onezone: Option<f64>,
    /// `ONEZONE_IA` flat rate.
    pub onezone_ia: f64,
}

impl RegionRates {
    fn apply(&self, table: PricingTable, region: &str) -> PricingTable {
        let express = self
            .express_onezone
            .map_or(ClassPricing::Unavailable, ClassPricing::flat);

        let table = table
            .with_class(
                region,
                StorageClass::Standard,
                ClassPricing::Tiered(build_tiers(&STANDARD_BREAKPOINTS_GB, &self.standard)),
            )
            .with_class(
                region,
                StorageClass::ReducedRedundancy,
                ClassPricing::Tiered(build_tiers(
                    &REDUCED_REDUNDANCY_BREAKPOINTS_GB,
                    &self.reduced_redundancy,
                )),
            )
            .with_class(region, StorageClass::StandardIa, ClassPricing::flat(self.standard_ia))
            .with_class(region, StorageClass::Glacier, ClassPricing::flat(self.glacier))
            .with_class(region, StorageClass::GlacierIr, ClassPricing::flat(self.glacier_ir))
            .with_class(region, StorageClass::DeepArchive, ClassPricing::flat(self.deep_archive))
            .with_class(region, StorageClass::OnezoneIa, ClassPricing::flat(self.onezone_ia))
            .with_class(region, StorageClass::ExpressOnezone, express);

        FREE_CLASSES.into_iter().fold(table, |table, class| {
            table.with_class(region, class, ClassPricing::Free)
        })
    }
}

/// Rates used for `RR` tiers in most regions.
const RR_COMMON: [f64; 6] = [0.024, 0.0236, 0.0232, 0.0228, 0.0224, 0.022];

/// AWS S3 storage list prices by region group.
pub const REGION_RATES: &[RegionRates] = &[
    RegionRates {
        regions: &["us-east-1", "us-east-2", "us-west-1", "us-west-2", "eu-north-1"],
        standard: [0.023, 0.022, 0.021],
        reduced_redundancy: RR_COMMON,
        standard_ia: 0.0125,
        glacier: 0.0036,
        glacier_ir: 0.004,
        deep_archive: 0.00099,
        express_onezone: Some(0.016),
        onezone_ia: 0.01,
    },
    RegionRates {
        regions: &["ca-central-1", "ca-west-1", "il-central-1", "me-south-1", "me-central-1"],
        standard: [0.025, 0.024, 0.023],
        reduced_redundancy: [0.0264, 0.026, 0.0255, 0.0251, 0.0246, 0.0242],
        standard_ia: 0.0138,
        glacier: 0.00405,
        glacier_ir: 0.005,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.01104,
    },
    RegionRates {
        regions: &["mx-central-1"],
        standard: [0.02415, 0.0231, 0.02205],
        reduced_redundancy: [0.0252, 0.02478, 0.02436, 0.02394, 0.02352, 0.0231],
        standard_ia: 0.013125,
        glacier: 0.00378,
        glacier_ir: 0.0042,
        deep_archive: 0.002,
        express_onezone: None,
        onezone_ia: 0.0105,
    },
    RegionRates {
        regions: &["us-gov-east-1", "us-gov-west-1"],
        standard: [0.039, 0.037, 0.0355],
        reduced_redundancy: [0.0312, 0.0306, 0.0301, 0.0296, 0.0291, 0.0285],
        standard_ia: 0.02,
        glacier: 0.0054,
        glacier_ir: 0.0064,
        deep_archive: 0.0024,
        express_onezone: None,
        onezone_ia: 0.016,
    },
    RegionRates {
        regions: &["af-south-1"],
        standard: [0.0274, 0.0262, 0.025],
        reduced_redundancy: RR_COMMON,
        standard_ia: 0.0149,
        glacier: 0.00405,
        glacier_ir: 0.005,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.0119,
    },
    RegionRates {
        regions: &[
            "ap-east-1",
            "ap-south-2",
            "ap-southeast-3",
            "ap-southeast-4",
            "ap-northeast-3",
            "ap-northeast-2",
            "ap-southeast-1",
            "ap-southeast-2",
        ],
        standard: [0.025, 0.024, 0.023],
        reduced_redundancy: RR_COMMON,
        standard_ia: 0.0138,
        glacier: 0.0045,
        glacier_ir: 0.005,
        deep_archive: 0.002,
        express_onezone: None,
        onezone_ia: 0.011,
    },
    RegionRates {
        regions: &["ap-south-1", "ap-northeast-1"],
        standard: [0.025, 0.024, 0.023],
        reduced_redundancy: RR_COMMON,
        standard_ia: 0.0138,
        glacier: 0.0045,
        glacier_ir: 0.005,
        deep_archive: 0.002,
        express_onezone: Some(0.18),
        onezone_ia: 0.011,
    },
    RegionRates {
        regions: &["ap-southeast-5", "ap-southeast-7"],
        standard: [0.0225, 0.0216, 0.0207],
        reduced_redundancy: [0.0216, 0.02124, 0.02088, 0.02052, 0.02016, 0.0198],
        standard_ia: 0.01242,
        glacier: 0.00405,
        glacier_ir: 0.0045,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.0099,
    },
    RegionRates {
        regions: &["eu-central-1"],
        standard: [0.0245, 0.0235, 0.0225],
        reduced_redundancy: [0.026, 0.0255, 0.0251, 0.0247, 0.0242, 0.0238],
        standard_ia: 0.0135,
        glacier: 0.00405,
        glacier_ir: 0.005,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.0108,
    },
    RegionRates {
        regions: &["eu-west-2", "eu-south-1", "eu-west-3"],
        standard: [0.024, 0.023, 0.022],
        reduced_redundancy: [0.0252, 0.0248, 0.0244, 0.0239, 0.0235, 0.0231],
        standard_ia: 0.0131,
        glacier: 0.00405,
        glacier_ir: 0.005,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.01048,
    },
    RegionRates {
        regions: &["eu-south-2"],
        standard: [0.023, 0.022, 0.021],
        reduced_redundancy: RR_COMMON,
        standard_ia: 0.0125,
        glacier: 0.00405,
        glacier_ir: 0.005,
        deep_archive: 0.0018,
        express_onezone: None,
        onezone_ia: 0.01,
    },
    RegionRates {
        regions: &["eu-central-2"],
        standard: [0.02695, 0.02585, 0.02475],
        reduced_redundancy: [0.0286, 0.02805, 0.02761, 0.02717, 0.02662, 0.02618],
        standard_ia: 0.01485,
        glacier: 0.004455,
        glacier_ir: 0.0055,
        deep_archive: 0.00198,
        express_onezone: None,
        onezone_ia: 0.01188,
    },
    RegionRates {
        regions: &["sa-east-1"],
        standard: [0.0405, 0.039, 0.037],
        reduced_redundancy: [0.0326, 0.032, 0.0315, 0.0309, 0.0304, 0.0299],
        standard_ia: 0.0221,
        glacier: 0.00765,
        glacier_ir: 0.0083,
        deep_archive: 0.0032,
        express_onezone: None,
        onezone_ia: 0.0177,
    },
];
