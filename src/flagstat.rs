//! Alignment summary (`samtools flagstat`) parsing

use crate::text::{dual_count, DualCount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properly_paired: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properly_paired_pct: Option<f64>,
}

impl AlignmentMetrics {
    /// Parse flagstat output.
    ///
    /// The total comes from the first line only. Mapped and properly-paired
    /// counts are recorded together with their percentage or not at all, and
    /// `primary mapped` lines are ignored. When a label repeats, the last line wins.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        let mut metrics = Self {
            total_reads: lines
                .next()
                .and_then(dual_count)
                .filter(|c| c.label.starts_with("in total"))
                .map(|c| c.passed),
            ..Self::default()
        };

        for line in text.lines() {
            let Some(count) = dual_count(line) else {
                continue;
            };
            if count.label.starts_with("duplicates") {
                metrics.duplicates = Some(count.passed);
            } else if count.label.starts_with("mapped (") && !line.contains("primary") {
                if let Some((n, pct)) = with_percent(&count) {
                    metrics.mapped = Some(n);
                    metrics.mapped_pct = Some(pct);
                }
            } else if count.label.starts_with("properly paired") {
                if let Some((n, pct)) = with_percent(&count) {
                    metrics.properly_paired = Some(n);
                    metrics.properly_paired_pct = Some(pct);
                }
            }
        }

        (metrics != Self::default()).then_some(metrics)
    }

    /// Duplicates as a percentage of total reads, absent without a non-zero total
    pub fn duplicate_pct(&self) -> Option<f64> {
        let total = self.total_reads.filter(|t| *t > 0)?;
        Some(self.duplicates? as f64 * 100.0 / total as f64)
    }
}

fn with_percent(count: &DualCount<'_>) -> Option<(u64, f64)> {
    count.percent().map(|pct| (count.passed, pct))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const FLAGSTAT: &str = indoc! {"
        10000 + 50 in total (QC-passed reads + QC-failed reads)
        9800 + 0 primary
        0 + 0 secondary
        200 + 0 supplementary
        1500 + 0 duplicates
        1400 + 0 primary duplicates
        9750 + 10 mapped (97.50% : N/A)
        9600 + 0 primary mapped (97.96% : N/A)
        9800 + 0 paired in sequencing
        4900 + 0 read1
        4900 + 0 read2
        9500 + 0 properly paired (96.94% : N/A)
        9700 + 0 with itself and mate mapped
        50 + 0 singletons (0.51% : N/A)
    "};

    #[test]
    fn test_parse_flagstat() {
        let metrics = AlignmentMetrics::parse(FLAGSTAT).unwrap();
        assert_eq!(metrics.total_reads, Some(10000));
        assert_eq!(metrics.duplicates, Some(1500));
        assert_eq!(metrics.mapped, Some(9750));
        assert_eq!(metrics.mapped_pct, Some(97.5));
        assert_eq!(metrics.properly_paired, Some(9500));
        assert_eq!(metrics.properly_paired_pct, Some(96.94));
    }

    #[test]
    fn test_total_never_adds_failed_count() {
        let metrics = AlignmentMetrics::parse("1000 + 50 in total\n").unwrap();
        assert_eq!(metrics.total_reads, Some(1000));
    }

    #[test]
    fn test_total_only_from_first_line() {
        let metrics = AlignmentMetrics::parse("5 + 0 duplicates\n1000 + 0 in total\n").unwrap();
        assert_eq!(metrics.total_reads, None);
        assert_eq!(metrics.duplicates, Some(5));
    }

    #[test]
    fn test_mapped_without_percent_is_absent() {
        let metrics = AlignmentMetrics::parse("100 + 0 in total\n90 + 0 mapped (N/A : N/A)\n").unwrap();
        assert_eq!(metrics.mapped, None);
        assert_eq!(metrics.mapped_pct, None);
    }

    #[test]
    fn test_unrecognized_text_is_absent() {
        assert!(AlignmentMetrics::parse("").is_none());
        assert!(AlignmentMetrics::parse("samtools: not a BAM file\n").is_none());
    }

    #[test]
    fn test_duplicate_pct() {
        let metrics = AlignmentMetrics::parse(FLAGSTAT).unwrap();
        assert_eq!(metrics.duplicate_pct(), Some(15.0));

        let zero = AlignmentMetrics {
            total_reads: Some(0),
            duplicates: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.duplicate_pct(), None);
    }
}
