//! Peak calling outputs: interval lists (narrowPeak/broadPeak) and FRiP logs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MIN_PEAK_COLUMNS: usize = 5;
const SCORE_COLUMN: usize = 6;

static FRIP_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FRiP.*?(\d+(?:\.\d*)?(?:[eE][-+]?\d+)?|\.\d+)").unwrap());

/// Summary of a called peak set.
///
/// Length statistics are present only when at least one interval parsed;
/// the score average only when at least one line carries a numeric 7th column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakCallMetrics {
    pub num_peaks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_peak_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_peak_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_peak_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_peak_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_peak_score: Option<f64>,
}

impl PeakCallMetrics {
    /// Summarise a peak file. Every line counts as a peak, blank or not; an
    /// empty file is a valid peak set with zero peaks.
    pub fn parse(text: &str) -> Self {
        let peaks: Vec<&str> = text.lines().collect();

        let mut lengths = Vec::with_capacity(peaks.len());
        let mut scores = Vec::new();
        for line in &peaks {
            let cols: Vec<&str> = line.trim_end().split('\t').collect();
            if cols.len() < MIN_PEAK_COLUMNS {
                continue;
            }
            let (Ok(start), Ok(end)) = (cols[1].trim().parse::<u64>(), cols[2].trim().parse::<u64>()) else {
                continue;
            };
            let Some(length) = end.checked_sub(start) else {
                continue;
            };
            lengths.push(length);

            if let Some(score) = cols
                .get(SCORE_COLUMN)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|s| s.is_finite())
            {
                scores.push(score);
            }
        }

        let mut metrics = Self {
            num_peaks: peaks.len() as u64,
            ..Self::default()
        };

        if !lengths.is_empty() {
            lengths.sort_unstable();
            metrics.avg_peak_length = Some(mean(lengths.iter().map(|l| *l as f64)));
            metrics.median_peak_length = Some(lengths[lengths.len() / 2]);
            metrics.min_peak_length = lengths.first().copied();
            metrics.max_peak_length = lengths.last().copied();
        }
        if !scores.is_empty() {
            metrics.avg_peak_score = Some(mean(scores.iter().copied()));
        }

        metrics
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    values.sum::<f64>() / n as f64
}

/// Fraction of reads in peaks, always in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FripScore {
    pub frip: f64,
}

impl FripScore {
    /// Take the first number after the first `FRiP` token on a line.
    ///
    /// Values in (1, 100] are read as percentages and scaled to a fraction;
    /// anything outside [0, 100] is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let raw: f64 = text
            .lines()
            .find_map(|line| FRIP_VALUE.captures(line))
            .and_then(|caps| caps[1].parse().ok())?;

        let frip = match raw {
            v if (0.0..=1.0).contains(&v) => v,
            v if v > 1.0 && v <= 100.0 => v / 100.0,
            _ => return None,
        };
        Some(Self { frip })
    }

    pub fn percent(&self) -> f64 {
        self.frip * 100.0
    }
}
