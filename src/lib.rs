//! ATAC-seq QC Tools
//!
//! Metrics extraction and quality verdicts for ATAC-seq pipeline outputs.
//!
//! This library provides shared functionality for:
//! - Parsing trimming logs, flagstat, Picard metrics, peak files, FRiP logs and FastQC reports
//! - Aggregating per-sample metrics from a pipeline results tree
//! - ATAC-seq aware pass/fail rules over FastQC reports
//! - Multi-sample QC summaries

pub mod cli;
pub mod error;
pub mod fastqc;
pub mod flagstat;
pub mod layout;
pub mod metrics;
pub mod peaks;
pub mod picard;
pub mod quality;
pub mod reporting;
pub mod text;
pub mod tiers;
pub mod trimming;

pub use error::{QcError, Result};
pub use fastqc::{FastQcRecord, ModuleStatus};
pub use layout::PipelineLayout;
pub use metrics::CanonicalSampleMetrics;
pub use quality::{ExpectedAnomalies, QcStatus, QcThresholds, QcVerdict, QualityChecker};
pub use reporting::{BatchSummary, PipelineReport, QcReporter};

use std::path::Path;

/// Sequencing sample identifier, compared as an exact, case-sensitive string
pub type SampleId = String;

/// Read a pipeline output as text. Invalid UTF-8 is replaced rather than rejected.
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| QcError::io(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
