//! Per-sample metrics aggregation
//!
//! Collects every format parser's record for one sample into a
//! [`CanonicalSampleMetrics`]. Missing files leave the field absent; an
//! unreadable file fails the sample.

use crate::error::Result;
use crate::flagstat::AlignmentMetrics;
use crate::layout::{FileSpec, PipelineLayout};
use crate::peaks::{FripScore, PeakCallMetrics};
use crate::picard::{DuplicationMetrics, FragmentSizeMetrics};
use crate::trimming::TrimMetrics;
use crate::{read_source, SampleId};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSampleMetrics {
    pub sample_id: SampleId,
    pub trim: Option<TrimMetrics>,
    pub alignment: Option<AlignmentMetrics>,
    pub duplication: Option<DuplicationMetrics>,
    pub peaks: Option<PeakCallMetrics>,
    pub frip: Option<FripScore>,
    pub fragment_size: Option<FragmentSizeMetrics>,
}

impl CanonicalSampleMetrics {
    pub fn empty(sample_id: impl Into<SampleId>) -> Self {
        Self {
            sample_id: sample_id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trim.is_none()
            && self.alignment.is_none()
            && self.duplication.is_none()
            && self.peaks.is_none()
            && self.frip.is_none()
            && self.fragment_size.is_none()
    }
}

/// Gather all records for one sample
pub fn collect_sample_metrics(
    root: &Path,
    layout: &PipelineLayout,
    sample: &str,
) -> Result<CanonicalSampleMetrics> {
    let metrics = CanonicalSampleMetrics {
        sample_id: sample.to_string(),
        trim: parse_first(&layout.trim_logs, layout, root, sample, TrimMetrics::parse)?,
        alignment: parse_one(&layout.flagstat, root, sample, AlignmentMetrics::parse)?,
        duplication: parse_one(&layout.duplication, root, sample, DuplicationMetrics::parse)?,
        peaks: parse_first(&layout.peaks, layout, root, sample, |text| {
            Some(PeakCallMetrics::parse(text))
        })?,
        frip: parse_one(&layout.frip, root, sample, FripScore::parse)?,
        fragment_size: parse_one(&layout.insert_size, root, sample, FragmentSizeMetrics::parse)?,
    };
    if metrics.is_empty() {
        debug!("No metric files found for {sample}");
    }
    Ok(metrics)
}

/// Collect metrics for every sample in parallel, ordered by sample id.
/// Samples whose files cannot be read are logged and left out.
pub fn collect_all<'a, I>(root: &Path, layout: &PipelineLayout, samples: I) -> Vec<CanonicalSampleMetrics>
where
    I: IntoIterator<Item = &'a SampleId>,
{
    let samples: Vec<&SampleId> = samples.into_iter().collect();
    let mut collected: Vec<CanonicalSampleMetrics> = samples
        .par_iter()
        .filter_map(|sample| match collect_sample_metrics(root, layout, sample) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!("Excluding sample {sample}: {e}");
                None
            }
        })
        .collect();
    collected.sort_by(|a, b| a.sample_id.cmp(&b.sample_id));
    collected
}

fn parse_one<T>(
    spec: &FileSpec,
    root: &Path,
    sample: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match spec.locate(root, sample)? {
        Some(path) => parse_path(&path, parse),
        None => Ok(None),
    }
}

fn parse_first<T>(
    specs: &[FileSpec],
    layout: &PipelineLayout,
    root: &Path,
    sample: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match layout.locate_first(specs, root, sample)? {
        Some(path) => parse_path(&path, parse),
        None => Ok(None),
    }
}

fn parse_path<T>(path: &Path, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>> {
    let text = read_source(path)?;
    let record = parse(&text);
    if record.is_none() {
        debug!("No recognisable data in {}", path.display());
    }
    Ok(record)
}
