//! Picard metrics files (MarkDuplicates, CollectInsertSizeMetrics)
//!
//! Both use the same layout: a header line of column names followed by a
//! single tab-separated data line. Values are looked up under their column
//! name so that extra columns added by newer Picard releases don't shift
//! the fields.

use crate::text::header_table;
use serde::{Deserialize, Serialize};

const DUPLICATION_MARKER: &str = "LIBRARY";
const DUPLICATION_COLUMNS: usize = 9;
const INSERT_SIZE_MARKER: &str = "MEDIAN_INSERT_SIZE";
const INSERT_SIZE_COLUMNS: usize = 5;

/// Duplicate marking summary.
///
/// `percent_duplication` is a percentage in [0, 100]; Picard writes it as a
/// fraction and it is scaled on parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaired_examined: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_pairs_examined: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmapped: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unpaired_duplicates: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_pair_duplicates: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_pair_optical_duplicates: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_duplication: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_library_size: Option<u64>,
}

impl DuplicationMetrics {
    pub fn parse(text: &str) -> Option<Self> {
        let table = header_table(text, DUPLICATION_MARKER, DUPLICATION_COLUMNS)?;

        let metrics = Self {
            unpaired_examined: table.get_u64("UNPAIRED_READS_EXAMINED"),
            read_pairs_examined: table.get_u64("READ_PAIRS_EXAMINED"),
            unmapped: table.get_u64("UNMAPPED_READS"),
            unpaired_duplicates: table.get_u64("UNPAIRED_READ_DUPLICATES"),
            read_pair_duplicates: table.get_u64("READ_PAIR_DUPLICATES"),
            read_pair_optical_duplicates: table.get_u64("READ_PAIR_OPTICAL_DUPLICATES"),
            percent_duplication: table
                .get_f64("PERCENT_DUPLICATION")
                .filter(|f| (0.0..=1.0).contains(f))
                .map(|f| f * 100.0),
            estimated_library_size: table.get_u64("ESTIMATED_LIBRARY_SIZE"),
        };

        (metrics != Self::default()).then_some(metrics)
    }
}

/// Fragment (insert) size distribution summary, in base pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentSizeMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_absolute_deviation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FragmentSizeMetrics {
    pub fn parse(text: &str) -> Option<Self> {
        let table = header_table(text, INSERT_SIZE_MARKER, INSERT_SIZE_COLUMNS)?;
        let size = |column: &str| table.get_f64(column).filter(|v| *v >= 0.0);

        let metrics = Self {
            median: size("MEDIAN_INSERT_SIZE"),
            mode: size("MODE_INSERT_SIZE"),
            median_absolute_deviation: size("MEDIAN_ABSOLUTE_DEVIATION"),
            min: size("MIN_INSERT_SIZE"),
            max: size("MAX_INSERT_SIZE"),
        };

        (metrics != Self::default()).then_some(metrics)
    }
}
