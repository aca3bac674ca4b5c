//! Multi-sample QC reporting module
//!
//! Folds per-report verdicts into a [`BatchSummary`] and per-sample metrics
//! into a [`PipelineReport`] for the HTML renderer.

use crate::error::{QcError, Result};
use crate::fastqc::FastQcRecord;
use crate::layout::{self, PipelineLayout, FASTQC_DATA_FILE};
use crate::metrics::{self, CanonicalSampleMetrics};
use crate::quality::{QcStatus, QcVerdict, QualityChecker};
use crate::text::format_thousands;
use crate::tiers::{FripTier, SampleTiers};
use crate::{read_source, SampleId};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const RULE: &str = "======================================================================";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_samples: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub requires_review: Vec<QcVerdict>,
    pub all_verdicts: Vec<QcVerdict>,
}

impl BatchSummary {
    /// Build the summary. Verdicts are ordered FAIL before PASS, then by
    /// sample id, whatever order they arrive in.
    pub fn from_verdicts(mut verdicts: Vec<QcVerdict>) -> Self {
        verdicts.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| a.sample_id.cmp(&b.sample_id))
                .then_with(|| a.issues.cmp(&b.issues))
                .then_with(|| a.warnings.cmp(&b.warnings))
        });

        let passed_count = verdicts.iter().filter(|v| v.status == QcStatus::Pass).count();
        let requires_review = verdicts.iter().filter(|v| v.requires_review()).cloned().collect();

        Self {
            total_samples: verdicts.len(),
            passed_count,
            failed_count: verdicts.len() - passed_count,
            requires_review,
            all_verdicts: verdicts,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total_samples == 0 {
            return 0.0;
        }
        self.passed_count as f64 / self.total_samples as f64 * 100.0
    }

    /// True only when at least one sample was evaluated and none failed
    pub fn all_passed(&self) -> bool {
        self.total_samples > 0 && self.failed_count == 0
    }
}

/// Console summary printed after a batch
impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{RULE}\nATAC-seq QC Summary\n{RULE}")?;
        writeln!(f, "Total samples analyzed: {}", self.total_samples)?;
        if self.total_samples == 0 {
            return writeln!(f, "\n⚠️  No samples were evaluated.");
        }

        let pass_rate = self.pass_rate();
        writeln!(f, "✅ Passed: {} ({pass_rate:.1}%)", self.passed_count)?;
        writeln!(f, "❌ Failed: {} ({:.1}%)", self.failed_count, 100.0 - pass_rate)?;

        if self.requires_review.is_empty() {
            return writeln!(f, "\n✅ All samples passed QC! No review needed.");
        }

        writeln!(
            f,
            "\n{RULE}\n⚠️  {} samples require review:\n{RULE}",
            self.requires_review.len()
        )?;
        for verdict in &self.requires_review {
            writeln!(f, "\n📋 Sample: {}", verdict.sample_id)?;
            writeln!(f, "   Status: {}", verdict.status)?;
            if !verdict.reports.is_empty() {
                writeln!(f, "   Reports: {}", verdict.reports.join(", "))?;
            }
            if !verdict.issues.is_empty() {
                writeln!(f, "   🔴 Critical issues:")?;
                for issue in &verdict.issues {
                    writeln!(f, "      • {issue}")?;
                }
            }
            if !verdict.warnings.is_empty() {
                writeln!(f, "   ⚠️  Warnings:")?;
                for warning in &verdict.warnings {
                    writeln!(f, "      • {warning}")?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReport {
    #[serde(flatten)]
    pub metrics: CanonicalSampleMetrics,
    pub tiers: SampleTiers,
}

/// Figures across all samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortOverview {
    pub sample_count: usize,
    pub total_peaks: u64,
    /// Mean FRiP (fraction) over samples that have one
    pub mean_frip: Option<f64>,
    pub mean_frip_tier: Option<FripTier>,
}

impl CohortOverview {
    pub fn from_samples(samples: &[CanonicalSampleMetrics]) -> Self {
        let frips: Vec<f64> = samples.iter().filter_map(|s| s.frip.map(|f| f.frip)).collect();
        let mean_frip = (!frips.is_empty()).then(|| frips.iter().sum::<f64>() / frips.len() as f64);

        Self {
            sample_count: samples.len(),
            total_peaks: samples
                .iter()
                .filter_map(|s| s.peaks.as_ref().map(|p| p.num_peaks))
                .sum(),
            mean_frip,
            mean_frip_tier: mean_frip.map(FripTier::from_fraction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub cohort: CohortOverview,
    pub samples: Vec<SampleReport>,
    pub qc: BatchSummary,
}

/// QC reporter for multi-sample analysis
#[derive(Debug, Clone, Default)]
pub struct QcReporter {
    pub checker: QualityChecker,
    pub layout: PipelineLayout,
}

impl QcReporter {
    pub fn new(checker: QualityChecker, layout: PipelineLayout) -> Self {
        Self { checker, layout }
    }

    /// Evaluate one `fastqc_data.txt`. Read failures and files that aren't
    /// FastQC reports are errors at this sample's boundary.
    pub fn check_report(&self, path: &Path) -> Result<QcVerdict> {
        let text = read_source(path)?;
        let record = FastQcRecord::parse(&text).ok_or_else(|| QcError::Unrecognized {
            path: path.to_path_buf(),
            format: "FastQC",
        })?;
        Ok(self.checker.evaluate(&layout::fastqc_report_sample(path), &record))
    }

    /// Evaluate every FastQC report below `dir`.
    ///
    /// Fails only when `dir` is missing or holds no usable report; a report
    /// that can't be evaluated is logged and left out of the counts.
    pub fn check_fastqc_dir(&self, dir: &Path) -> Result<BatchSummary> {
        Ok(BatchSummary::from_verdicts(self.report_verdicts(dir)?))
    }

    /// Full report: metrics for every discovered sample plus one verdict per
    /// sample, folded from that sample's FastQC reports.
    ///
    /// A missing or empty `fastqc_dir` doesn't stop the metrics; the QC
    /// summary is then empty.
    pub fn pipeline_report(&self, results_dir: &Path, fastqc_dir: &Path) -> Result<PipelineReport> {
        layout::require_dir(results_dir)?;
        let mut samples = self.layout.discover_samples(results_dir)?;

        let report_verdicts = match self.report_verdicts(fastqc_dir) {
            Ok(verdicts) => verdicts,
            Err(e @ (QcError::DirectoryNotFound(_) | QcError::NoInputs { .. })) => {
                warn!("FastQC evaluation skipped: {e}");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut by_sample: BTreeMap<SampleId, Vec<QcVerdict>> = BTreeMap::new();
        for verdict in report_verdicts {
            let sample = layout::reconcile_fastqc_stem(&verdict.sample_id, &samples);
            by_sample.entry(sample).or_default().push(verdict);
        }
        samples.extend(by_sample.keys().cloned());

        if samples.is_empty() {
            return Err(QcError::NoInputs {
                root: results_dir.to_path_buf(),
                pattern: "sample".to_string(),
            });
        }
        info!(
            "Found {} samples: {}",
            samples.len(),
            samples.iter().cloned().collect::<Vec<_>>().join(", ")
        );

        let qc = BatchSummary::from_verdicts(
            by_sample
                .into_iter()
                .map(|(sample, verdicts)| QcVerdict::merge(&sample, verdicts))
                .collect(),
        );
        let collected = metrics::collect_all(results_dir, &self.layout, &samples);
        let cohort = CohortOverview::from_samples(&collected);
        let samples = collected
            .into_iter()
            .map(|metrics| SampleReport {
                tiers: SampleTiers::from_metrics(&metrics),
                metrics,
            })
            .collect();

        Ok(PipelineReport { cohort, samples, qc })
    }

    /// One verdict per FastQC report, named after the report
    fn report_verdicts(&self, dir: &Path) -> Result<Vec<QcVerdict>> {
        layout::require_dir(dir)?;
        let reports = layout::discover_fastqc_reports(dir);
        if reports.is_empty() {
            return Err(QcError::NoInputs {
                root: dir.to_path_buf(),
                pattern: FASTQC_DATA_FILE.to_string(),
            });
        }
        info!("Found {} FastQC reports to analyze", reports.len());

        let verdicts: Vec<QcVerdict> = reports
            .par_iter()
            .filter_map(|path| match self.check_report(path) {
                Ok(verdict) => Some(verdict),
                Err(e) => {
                    warn!("Error processing {}: {e}", path.display());
                    None
                }
            })
            .collect();

        if verdicts.is_empty() {
            return Err(QcError::NoInputs {
                root: dir.to_path_buf(),
                pattern: "recognisable FastQC".to_string(),
            });
        }
        Ok(verdicts)
    }

    /// Export report to JSON
    pub fn export_json<T: Serialize, P: AsRef<Path>>(&self, report: &T, path: P) -> Result<()> {
        let json_content = serde_json::to_string_pretty(report)?;
        std::fs::write(path.as_ref(), json_content).map_err(|e| QcError::io(path.as_ref(), e))?;
        Ok(())
    }
}

/// One line per sample for a peak overview, e.g. `S1: 52,013 peaks (FRiP 31.0%, good)`
pub fn peak_line(sample: &SampleReport) -> String {
    let peaks = sample
        .metrics
        .peaks
        .as_ref()
        .map(|p| format!("{} peaks", format_thousands(p.num_peaks)))
        .unwrap_or_else(|| "no peaks".to_string());
    match (sample.metrics.frip, sample.tiers.frip) {
        (Some(frip), Some(tier)) => format!(
            "{}: {peaks} (FRiP {:.1}%, {})",
            sample.metrics.sample_id,
            frip.percent(),
            tier
        ),
        _ => format!("{}: {peaks}", sample.metrics.sample_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::{FripScore, PeakCallMetrics};
    use pretty_assertions::assert_eq;

    fn verdict(sample: &str, issues: &[&str], warnings: &[&str]) -> QcVerdict {
        QcVerdict {
            sample_id: sample.to_string(),
            status: if issues.is_empty() { QcStatus::Pass } else { QcStatus::Fail },
            issues: issues.iter().map(|s| s.to_string()).collect(),
            warnings: warnings.iter().map(|s| s.to_string()).collect(),
            basic_stats: BTreeMap::new(),
            reports: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts_and_order() {
        let summary = BatchSummary::from_verdicts(vec![
            verdict("C", &[], &["Warning: Per sequence GC content"]),
            verdict("B", &["Unexpected FAIL: Overrepresented sequences"], &[]),
            verdict("A", &[], &[]),
            verdict("D", &["Short reads: minimum 35bp (recommended: >50bp)"], &[]),
        ]);

        assert_eq!(summary.total_samples, 4);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.failed_count, 2);
        assert_eq!(summary.passed_count + summary.failed_count, summary.total_samples);

        let order: Vec<&str> = summary.all_verdicts.iter().map(|v| v.sample_id.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "A", "C"]);

        let review: Vec<&str> = summary.requires_review.iter().map(|v| v.sample_id.as_str()).collect();
        assert_eq!(review, vec!["B", "D"]);
        assert!(!summary.all_passed());
        assert_eq!(summary.pass_rate(), 50.0);
    }

    #[test]
    fn test_order_ignores_arrival_order() {
        let a = vec![verdict("S2", &[], &[]), verdict("S1", &["x"], &[]), verdict("S3", &[], &[])];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(BatchSummary::from_verdicts(a), BatchSummary::from_verdicts(b));
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_verdicts(Vec::new());
        assert_eq!(summary.total_samples, 0);
        assert_eq!(summary.pass_rate(), 0.0);
        assert!(!summary.all_passed());
        assert!(summary.to_string().contains("No samples were evaluated"));
        assert!(!summary.to_string().contains("All samples passed"));
    }

    #[test]
    fn test_cohort_overview() {
        let mut s1 = CanonicalSampleMetrics::empty("S1");
        s1.peaks = Some(PeakCallMetrics {
            num_peaks: 1000,
            ..Default::default()
        });
        s1.frip = Some(FripScore { frip: 0.3 });
        let mut s2 = CanonicalSampleMetrics::empty("S2");
        s2.peaks = Some(PeakCallMetrics {
            num_peaks: 500,
            ..Default::default()
        });
        s2.frip = Some(FripScore { frip: 0.1 });
        let s3 = CanonicalSampleMetrics::empty("S3");

        let cohort = CohortOverview::from_samples(&[s1, s2, s3]);
        assert_eq!(cohort.sample_count, 3);
        assert_eq!(cohort.total_peaks, 1500);
        assert!((cohort.mean_frip.unwrap() - 0.2).abs() < 1e-12);

        let empty = CohortOverview::from_samples(&[CanonicalSampleMetrics::empty("S1")]);
        assert_eq!(empty.mean_frip, None);
        assert_eq!(empty.mean_frip_tier, None);
    }

    #[test]
    fn test_console_summary_lists_review() {
        let summary = BatchSummary::from_verdicts(vec![
            verdict("S1", &["Unexpected FAIL: Adapter Content"], &["Warning: Kmer"]),
            verdict("S2", &[], &[]),
        ]);
        let text = summary.to_string();
        assert!(text.contains("Total samples analyzed: 2"));
        assert!(text.contains("✅ Passed: 1 (50.0%)"));
        assert!(text.contains("❌ Failed: 1 (50.0%)"));
        assert!(text.contains("1 samples require review"));
        assert!(text.contains("📋 Sample: S1"));
        assert!(text.contains("      • Unexpected FAIL: Adapter Content"));
        assert!(text.contains("      • Warning: Kmer"));
        assert!(!text.contains("Sample: S2"));
    }

    #[test]
    fn test_console_summary_all_passed() {
        let summary = BatchSummary::from_verdicts(vec![verdict("S1", &[], &["Warning: x"])]);
        assert!(summary.to_string().contains("All samples passed QC"));
    }

    #[test]
    fn test_peak_line() {
        let mut metrics = CanonicalSampleMetrics::empty("S1");
        metrics.peaks = Some(PeakCallMetrics {
            num_peaks: 52013,
            ..Default::default()
        });
        metrics.frip = Some(FripScore { frip: 0.31 });
        let sample = SampleReport {
            tiers: SampleTiers::from_metrics(&metrics),
            metrics,
        };
        assert_eq!(peak_line(&sample), "S1: 52,013 peaks (FRiP 31.0%, good)");

        let bare = CanonicalSampleMetrics::empty("S2");
        let sample = SampleReport {
            tiers: SampleTiers::default(),
            metrics: bare,
        };
        assert_eq!(peak_line(&sample), "S2: no peaks");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_value(verdict("S1", &["x"], &[])).unwrap();
        assert_eq!(json["status"], "FAIL");
        assert_eq!(json["sample_id"], "S1");
    }
}
