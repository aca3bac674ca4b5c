//! ATAC-seq aware quality rules over FastQC reports
//!
//! Some FastQC modules routinely warn or fail on good ATAC-seq libraries
//! (Tn5 insertion bias at the read start, high duplication over open
//! chromatin, k-mer preference). Those are listed in [`ExpectedAnomalies`]
//! and never turn into issues; everything else is judged against
//! [`QcThresholds`].

use crate::error::{QcError, Result};
use crate::fastqc::{FastQcRecord, ModuleStatus, ADAPTER_CONTENT};
use crate::text::format_thousands;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Below this many reads the sample gets a depth advisory
const LOW_READ_COUNT: u64 = 1_000_000;
/// Poor-quality flagged reads above this percentage of the total are an issue
const MAX_POOR_QUALITY_PCT: f64 = 5.0;
/// Fraction of low-quality positions that earns a warning
const LOW_QUALITY_WARN_FRACTION: f64 = 0.10;

/// Thresholds for the rule engine.
///
/// Percentages are in [0, 100]; `min_passing_quality_fraction` is a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    pub min_mean_quality: f64,
    #[serde(alias = "min_passing_quality_pct")]
    pub min_passing_quality_fraction: f64,
    pub max_adapter_content: f64,
    /// Not checked on its own; duplication is judged by module status
    pub max_duplication_pct: f64,
    pub min_sequence_length: u64,
    pub min_gc_content: f64,
    pub max_gc_content: f64,
    /// Not checked on its own
    pub max_n_content: f64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self {
            min_mean_quality: 28.0,
            min_passing_quality_fraction: 0.8,
            max_adapter_content: 10.0,
            max_duplication_pct: 85.0,
            min_sequence_length: 50,
            min_gc_content: 30.0,
            max_gc_content: 65.0,
            max_n_content: 5.0,
        }
    }
}

impl QcThresholds {
    /// Load thresholds from a JSON file; missing keys keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = crate::read_source(path.as_ref())?;
        let thresholds: Self = serde_json::from_str(&content)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_passing_quality_fraction) {
            return Err(QcError::InvalidConfig(format!(
                "min_passing_quality_fraction must be within 0..=1, got {}",
                self.min_passing_quality_fraction
            )));
        }
        let percentages = [
            ("max_adapter_content", self.max_adapter_content),
            ("max_duplication_pct", self.max_duplication_pct),
            ("min_gc_content", self.min_gc_content),
            ("max_gc_content", self.max_gc_content),
            ("max_n_content", self.max_n_content),
        ];
        for (name, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(QcError::InvalidConfig(format!(
                    "{name} must be a percentage within 0..=100, got {value}"
                )));
            }
        }
        if self.min_mean_quality < 0.0 {
            return Err(QcError::InvalidConfig(format!(
                "min_mean_quality must not be negative, got {}",
                self.min_mean_quality
            )));
        }
        if self.min_gc_content > self.max_gc_content {
            return Err(QcError::InvalidConfig(format!(
                "min_gc_content ({}) exceeds max_gc_content ({})",
                self.min_gc_content, self.max_gc_content
            )));
        }
        Ok(())
    }
}

/// FastQC modules whose warn/fail status is normal for the assay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedAnomalies {
    modules: BTreeSet<String>,
}

impl ExpectedAnomalies {
    pub fn atac_seq() -> Self {
        Self::new([
            "Per base sequence content",
            "Sequence Duplication Levels",
            "Kmer Content",
            "Per tile sequence quality",
        ])
    }

    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains(module)
    }
}

impl Default for ExpectedAnomalies {
    fn default() -> Self {
        Self::atac_seq()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QcStatus {
    // FAIL sorts first in summaries
    Fail,
    Pass,
}

impl fmt::Display for QcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcVerdict {
    pub sample_id: String,
    pub status: QcStatus,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub basic_stats: BTreeMap<String, String>,
    /// FastQC reports folded into this verdict when it covers a whole sample
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<String>,
}

impl QcVerdict {
    pub fn requires_review(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Fold the per-report verdicts of one sample (R1, R2, ...) into one.
    ///
    /// Reports are taken in name order. Messages keep that order with repeats
    /// dropped, and basic statistics come from the first report.
    pub fn merge(sample_id: &str, mut verdicts: Vec<QcVerdict>) -> Self {
        verdicts.sort_by(|a, b| a.sample_id.cmp(&b.sample_id));

        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut basic_stats = None;
        let mut reports = Vec::with_capacity(verdicts.len());
        for verdict in verdicts {
            extend_unique(&mut issues, verdict.issues);
            extend_unique(&mut warnings, verdict.warnings);
            basic_stats.get_or_insert(verdict.basic_stats);
            reports.push(verdict.sample_id);
        }

        Self {
            sample_id: sample_id.to_string(),
            status: if issues.is_empty() { QcStatus::Pass } else { QcStatus::Fail },
            issues,
            warnings,
            basic_stats: basic_stats.unwrap_or_default(),
            reports,
        }
    }
}

fn extend_unique(into: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

/// Stateless rule engine
#[derive(Debug, Clone, Default)]
pub struct QualityChecker {
    pub thresholds: QcThresholds,
    pub expected: ExpectedAnomalies,
}

impl QualityChecker {
    pub fn new(thresholds: QcThresholds, expected: ExpectedAnomalies) -> Self {
        Self {
            thresholds,
            expected,
        }
    }

    /// Apply every rule to one report. Each rule runs independently; a
    /// basic statistic that doesn't parse just skips its rule.
    pub fn evaluate(&self, sample_id: &str, record: &FastQcRecord) -> QcVerdict {
        let mut findings = Findings::default();

        self.check_basic_stats(record, &mut findings);
        self.check_per_base_quality(record, &mut findings);
        self.check_module_statuses(record, &mut findings);
        self.check_adapter_content(record, &mut findings);

        let status = if findings.issues.is_empty() {
            QcStatus::Pass
        } else {
            QcStatus::Fail
        };

        QcVerdict {
            sample_id: sample_id.to_string(),
            status,
            issues: findings.issues,
            warnings: findings.warnings,
            basic_stats: record.basic_stats.clone(),
            reports: Vec::new(),
        }
    }

    fn check_basic_stats(&self, record: &FastQcRecord, findings: &mut Findings) {
        let t = &self.thresholds;
        let total = stat::<u64>(record, "Total Sequences");

        if let Some(total) = total {
            if total < LOW_READ_COUNT {
                findings.warnings.push(format!(
                    "Low read count: {} reads (recommended: >5M for ATAC-seq)",
                    format_thousands(total)
                ));
            }
        }

        if let Some((min_len, _max_len)) = record.basic_stat("Sequence length").and_then(length_range) {
            if min_len < t.min_sequence_length {
                findings.issues.push(format!(
                    "Short reads: minimum {min_len}bp (recommended: >{}bp)",
                    t.min_sequence_length
                ));
            }
        }

        if let Some(gc) = stat::<f64>(record, "%GC") {
            if gc < t.min_gc_content {
                findings.issues.push(format!(
                    "Low GC content: {gc}% (expected: >{}%)",
                    t.min_gc_content
                ));
            } else if gc > t.max_gc_content {
                findings.issues.push(format!(
                    "High GC content: {gc}% (expected: <{}%)",
                    t.max_gc_content
                ));
            }
        }

        if let Some(poor) = stat::<u64>(record, "Sequences flagged as poor quality").filter(|p| *p > 0) {
            match total.filter(|t| *t > 0) {
                Some(total) => {
                    let pct = poor as f64 / total as f64 * 100.0;
                    if pct > MAX_POOR_QUALITY_PCT {
                        findings.issues.push(format!(
                            "High poor quality sequences: {} ({pct:.1}%)",
                            format_thousands(poor)
                        ));
                    }
                }
                None => debug!("poor quality count without a usable total, rule skipped"),
            }
        }
    }

    fn check_per_base_quality(&self, record: &FastQcRecord, findings: &mut Findings) {
        let t = &self.thresholds;
        let total = record.per_base_quality.len();
        if total == 0 {
            return;
        }

        let low = record
            .per_base_quality
            .iter()
            .filter(|b| b.mean < t.min_mean_quality)
            .count();
        let frac_low = low as f64 / total as f64;

        if frac_low > 1.0 - t.min_passing_quality_fraction {
            findings.issues.push(format!(
                "Low quality bases: {low}/{total} positions below Q{} ({:.1}% of read)",
                t.min_mean_quality,
                frac_low * 100.0
            ));
        } else if frac_low > LOW_QUALITY_WARN_FRACTION {
            findings.warnings.push(format!(
                "Some low quality bases: {low}/{total} positions below Q{}",
                t.min_mean_quality
            ));
        }
    }

    fn check_module_statuses(&self, record: &FastQcRecord, findings: &mut Findings) {
        for module in &record.modules {
            if self.expected.contains(&module.name) {
                continue;
            }
            match module.status {
                ModuleStatus::Fail => findings
                    .issues
                    .push(format!("Unexpected FAIL: {}", module.name)),
                ModuleStatus::Warn => findings.warnings.push(format!("Warning: {}", module.name)),
                ModuleStatus::Pass => {}
            }
        }
    }

    fn check_adapter_content(&self, record: &FastQcRecord, findings: &mut Findings) {
        if record.status(ADAPTER_CONTENT) != Some(ModuleStatus::Fail) {
            return;
        }
        let max_adapter = record.adapter_max_pct.unwrap_or(0.0);
        if max_adapter > self.thresholds.max_adapter_content {
            findings.issues.push(format!(
                "High adapter content: {max_adapter:.1}% (threshold: {}%)",
                self.thresholds.max_adapter_content
            ));
        }
    }
}

/// Evaluate with the ATAC-seq allowlist
pub fn evaluate(sample_id: &str, record: &FastQcRecord, thresholds: &QcThresholds) -> QcVerdict {
    QualityChecker::new(thresholds.clone(), ExpectedAnomalies::atac_seq()).evaluate(sample_id, record)
}

#[derive(Default)]
struct Findings {
    issues: Vec<String>,
    warnings: Vec<String>,
}

fn stat<T: std::str::FromStr>(record: &FastQcRecord, key: &str) -> Option<T> {
    let raw = record.basic_stat(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        debug!("unparseable basic statistic {key}={raw:?}, rule skipped");
    }
    parsed
}

/// `151` or `35-151`
fn length_range(raw: &str) -> Option<(u64, u64)> {
    match raw.trim().split_once('-') {
        Some((lo, hi)) => Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?)),
        None => {
            let len = raw.trim().parse().ok()?;
            Some((len, len))
        }
    }
}
