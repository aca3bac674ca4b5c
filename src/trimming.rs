//! Adapter trimming log parsing
//!
//! Reads the summary block that Trim Galore!/Cutadapt write at the end of a
//! trimming report:
//!
//! ```text
//! Total reads processed:              12,345,678
//! Reads with adapters:                 4,567,890 (37.0%)
//! Reads written (passing filters):    12,300,000 (99.6%)
//! ```

use crate::text::parse_grouped_u64;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TOTAL_READS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total reads processed:\s+([\d,]+)").unwrap());
static READS_WITH_ADAPTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Reads with adapters:\s+([\d,]+)").unwrap());
static READS_PASSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Reads written \(passing filters\):\s+([\d,]+)").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reads: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reads_with_adapters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reads_passed: Option<u64>,
}

impl TrimMetrics {
    /// Parse a trimming report. Each field is extracted on its own; the record
    /// is absent only when none of them is found.
    pub fn parse(text: &str) -> Option<Self> {
        let capture = |re: &Regex| {
            re.captures(text)
                .and_then(|caps| parse_grouped_u64(&caps[1]))
        };

        let metrics = Self {
            total_reads: capture(&TOTAL_READS),
            reads_with_adapters: capture(&READS_WITH_ADAPTERS),
            reads_passed: capture(&READS_PASSED),
        };

        (metrics != Self::default()).then_some(metrics)
    }

    /// Percentage of processed reads written out, absent without a non-zero total
    pub fn pass_rate_pct(&self) -> Option<f64> {
        let total = self.total_reads.filter(|t| *t > 0)?;
        Some(self.reads_passed? as f64 * 100.0 / total as f64)
    }
}
