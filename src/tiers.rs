//! Coarse ATAC-seq grades derived from canonical metrics
//!
//! These don't affect the pass/fail verdict; they are carried in the report
//! for the renderer.

use crate::metrics::CanonicalSampleMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trimming pass rate above this is considered good
pub const GOOD_TRIM_PASS_RATE_PCT: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FripTier {
    /// above 20%
    Good,
    /// above 10%, up to 20%
    Acceptable,
    Poor,
}

impl FripTier {
    pub fn from_fraction(frip: f64) -> Self {
        if frip > 0.20 {
            Self::Good
        } else if frip > 0.10 {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for FripTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Poor => "poor",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingTier {
    Excellent,
    Good,
    Check,
}

impl MappingTier {
    pub fn from_pct(mapped_pct: f64) -> Self {
        if mapped_pct > 90.0 {
            Self::Excellent
        } else if mapped_pct > 80.0 {
            Self::Good
        } else {
            Self::Check
        }
    }
}

/// Shape of the fragment size distribution, judged by its median
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NucleosomePattern {
    /// median below 150bp: nucleosome-free fragments dominate
    StrongNfr,
    Mixed,
    NucleosomeRich,
}

impl NucleosomePattern {
    pub fn from_median(median: f64) -> Self {
        if median < 150.0 {
            Self::StrongNfr
        } else if median < 250.0 {
            Self::Mixed
        } else {
            Self::NucleosomeRich
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleTiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frip: Option<FripTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nucleosome_pattern: Option<NucleosomePattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_pass_rate_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_pass_rate_good: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_pct: Option<f64>,
}

impl SampleTiers {
    pub fn from_metrics(metrics: &CanonicalSampleMetrics) -> Self {
        let trim_pass_rate_pct = metrics.trim.as_ref().and_then(|t| t.pass_rate_pct());
        Self {
            frip: metrics.frip.map(|f| FripTier::from_fraction(f.frip)),
            mapping: metrics
                .alignment
                .as_ref()
                .and_then(|a| a.mapped_pct)
                .map(MappingTier::from_pct),
            nucleosome_pattern: metrics
                .fragment_size
                .as_ref()
                .and_then(|f| f.median)
                .map(NucleosomePattern::from_median),
            trim_pass_rate_pct,
            trim_pass_rate_good: trim_pass_rate_pct.map(|r| r > GOOD_TRIM_PASS_RATE_PCT),
            duplicate_pct: metrics.alignment.as_ref().and_then(|a| a.duplicate_pct()),
        }
    }
}
