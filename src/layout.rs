//! Where each pipeline output lives under a results directory
//!
//! The default layout follows the nf-core/atacseq `results/` tree. Paths are
//! configuration: a different pipeline can load its own layout from JSON.

use crate::error::{QcError, Result};
use crate::SampleId;
use glob::Pattern;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// FastQC writes its parsed data here inside each `<name>_fastqc/` directory
pub const FASTQC_DATA_FILE: &str = "fastqc_data.txt";

/// Read/lane/trim tokens FastQC stems carry after the sample id:
/// `_R1`, `_2`, `_T1_1`, `_1_val_1`, `_R2_trimmed`
const READ_TAIL: &str = r"(?:_T\d+)?_R?[12](?:_val_[12])?(?:_trimmed)?";

static READ_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^(.+?){READ_TAIL}$")).unwrap());
static READ_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{READ_TAIL}$")).unwrap());

/// A file kind inside the results tree: `<dir>/<sample><suffix>`, or
/// `<dir>/<sample>*<suffix>` when `wildcard` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    pub dir: PathBuf,
    pub suffix: String,
    #[serde(default)]
    pub wildcard: bool,
}

impl FileSpec {
    pub fn exact(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            wildcard: false,
        }
    }

    pub fn prefixed(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            wildcard: true,
        }
    }

    /// Find this sample's file.
    ///
    /// Wildcard lookups take the first match in sorted order among candidates
    /// whose name continues with a non-alphanumeric character right after the
    /// sample id, so `S1` never picks up `S10_peaks.narrowPeak`.
    pub fn locate(&self, root: &Path, sample: &str) -> Result<Option<PathBuf>> {
        let dir = root.join(&self.dir);
        if !self.wildcard {
            let path = dir.join(format!("{sample}{}", self.suffix));
            return Ok(path.is_file().then_some(path));
        }

        let mut candidates: Vec<PathBuf> = self
            .glob_in(&dir, &format!("{}*", Pattern::escape(sample)))?
            .into_iter()
            .filter(|path| {
                file_name(path)
                    .and_then(|name| name.strip_prefix(sample))
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| !c.is_ascii_alphanumeric())
            })
            .collect();
        candidates.sort();
        Ok(candidates.into_iter().next())
    }

    /// Every file of this kind in the directory, sorted
    pub fn list(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = self.glob_in(&root.join(&self.dir), "*")?;
        paths.sort();
        Ok(paths)
    }

    /// Strip the suffix from a file name of this kind
    pub fn stem<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_suffix(self.suffix.as_str())
            .filter(|stem| !stem.is_empty())
    }

    fn glob_in(&self, dir: &Path, name_pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/{}{}",
            Pattern::escape(&dir.to_string_lossy()),
            name_pattern,
            Pattern::escape(&self.suffix)
        );
        let mut paths = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry: {e}"),
            }
        }
        Ok(paths)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineLayout {
    pub fastqc_archives: FileSpec,
    pub alignments: FileSpec,
    /// Tried in order; the first one with a match wins
    pub trim_logs: Vec<FileSpec>,
    pub flagstat: FileSpec,
    pub duplication: FileSpec,
    pub insert_size: FileSpec,
    /// Tried in order; the first one with a match wins
    pub peaks: Vec<FileSpec>,
    pub frip: FileSpec,
}

impl Default for PipelineLayout {
    fn default() -> Self {
        let library = PathBuf::from("bwa/mergedLibrary");
        Self {
            fastqc_archives: FileSpec::exact("fastqc", "_fastqc.zip"),
            alignments: FileSpec::exact(&library, ".mLb.clN.sorted.bam"),
            trim_logs: vec![
                FileSpec::prefixed("trimgalore", ".txt"),
                FileSpec::prefixed("trimgalore/logs", ".log"),
            ],
            flagstat: FileSpec::exact(&library, ".mLb.clN.sorted.bam.flagstat"),
            duplication: FileSpec::exact(
                library.join("picard_metrics"),
                ".mLb.clN.sorted.MarkDuplicates.metrics.txt",
            ),
            insert_size: FileSpec::exact(
                library.join("picard_metrics"),
                ".mLb.clN.sorted.CollectInsertSizeMetrics.txt",
            ),
            peaks: vec![
                FileSpec::prefixed(library.join("macs2"), "_peaks.narrowPeak"),
                FileSpec::prefixed(library.join("macs2"), "_peaks.broadPeak"),
            ],
            frip: FileSpec::exact(library.join("macs2/qc"), "_FRiP.txt"),
        }
    }
}

impl PipelineLayout {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = crate::read_source(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Default FastQC evaluation directory for a results root
    pub fn fastqc_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.fastqc_archives.dir)
    }

    pub fn locate_first(&self, specs: &[FileSpec], root: &Path, sample: &str) -> Result<Option<PathBuf>> {
        for spec in specs {
            if let Some(path) = spec.locate(root, sample)? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Union of sample ids seen in FastQC archive names and alignment names.
    ///
    /// Alignment names carry the sample id verbatim. A FastQC stem is matched
    /// to the longest alignment-derived id it equals or extends by read tokens
    /// only; failing that, its read suffix is stripped.
    pub fn discover_samples(&self, root: &Path) -> Result<BTreeSet<SampleId>> {
        let aligned: BTreeSet<SampleId> = self
            .alignments
            .list(root)?
            .iter()
            .filter_map(|p| file_name(p).and_then(|n| self.alignments.stem(n)))
            .map(str::to_string)
            .collect();

        let fastqc_stems: Vec<String> = self
            .fastqc_archives
            .list(root)?
            .iter()
            .filter_map(|p| file_name(p).and_then(|n| self.fastqc_archives.stem(n)))
            .map(str::to_string)
            .collect();

        let mut samples = aligned.clone();
        for stem in &fastqc_stems {
            let sample = reconcile_fastqc_stem(stem, &aligned);
            debug!("FastQC archive {stem} -> sample {sample}");
            samples.insert(sample);
        }
        Ok(samples)
    }
}

/// Map a FastQC stem onto a sample id.
///
/// A known id matches when the stem equals it or continues with nothing but
/// read/trim tokens, so `WT_REP1_R1` never folds into a sample named `WT`.
pub fn reconcile_fastqc_stem(stem: &str, known: &BTreeSet<SampleId>) -> SampleId {
    let matched = known
        .iter()
        .filter(|id| {
            stem.strip_prefix(id.as_str())
                .is_some_and(|rest| rest.is_empty() || READ_ONLY.is_match(rest))
        })
        .max_by_key(|id| id.len());
    if let Some(id) = matched {
        return id.clone();
    }

    READ_SUFFIX
        .captures(stem)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| stem.to_string())
}

/// Every `fastqc_data.txt` below `dir`, in path order
pub fn discover_fastqc_reports(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping directory entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == FASTQC_DATA_FILE)
        .map(|entry| entry.into_path())
        .collect()
}

/// Sample name of a FastQC report: its directory name without `_fastqc`
pub fn fastqc_report_sample(path: &Path) -> SampleId {
    path.parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .map(|name| name.replace("_fastqc", ""))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fail fast when an input root is missing
pub fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(QcError::DirectoryNotFound(path.to_path_buf()))
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn ids(items: &[&str]) -> BTreeSet<SampleId> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reconcile_against_alignment_ids() {
        let known = ids(&["WT_REP1", "WT_REP10", "KO_REP1"]);
        assert_eq!(reconcile_fastqc_stem("WT_REP1_T1_1_val_1", &known), "WT_REP1");
        assert_eq!(reconcile_fastqc_stem("WT_REP10_R2", &known), "WT_REP10");
        assert_eq!(reconcile_fastqc_stem("KO_REP1", &known), "KO_REP1");
    }

    #[test]
    fn test_reconcile_does_not_fold_into_shorter_sample() {
        let known = ids(&["WT"]);
        assert_eq!(reconcile_fastqc_stem("WT_REP1_R1", &known), "WT_REP1");
        assert_eq!(reconcile_fastqc_stem("WT_R2", &known), "WT");
        assert_eq!(reconcile_fastqc_stem("WT_1_val_1", &known), "WT");
    }

    #[test]
    fn test_reconcile_strips_read_suffix_without_alignments() {
        let known = BTreeSet::new();
        assert_eq!(reconcile_fastqc_stem("SAMPLE_R1", &known), "SAMPLE");
        assert_eq!(reconcile_fastqc_stem("SAMPLE_1_val_1", &known), "SAMPLE");
        assert_eq!(reconcile_fastqc_stem("WT_REP2_T1_2", &known), "WT_REP2");
        assert_eq!(reconcile_fastqc_stem("SAMPLE", &known), "SAMPLE");
    }

    #[test]
    fn test_discover_samples_unions_formats() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "fastqc/WT_REP1_R1_fastqc.zip");
        touch(root, "fastqc/WT_REP1_R2_fastqc.zip");
        touch(root, "fastqc/ONLY_QC_R1_fastqc.zip");
        touch(root, "fastqc/WT_REP1_R1_fastqc.html");
        touch(root, "bwa/mergedLibrary/WT_REP1.mLb.clN.sorted.bam");
        touch(root, "bwa/mergedLibrary/ONLY_BAM.mLb.clN.sorted.bam");

        let samples = PipelineLayout::default().discover_samples(root).unwrap();
        assert_eq!(samples, ids(&["ONLY_BAM", "ONLY_QC", "WT_REP1"]));
    }

    #[test]
    fn test_discover_samples_on_empty_tree() {
        let dir = TempDir::new().unwrap();
        let samples = PipelineLayout::default().discover_samples(dir.path()).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn test_prefixed_lookup_guards_sample_boundary() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "bwa/mergedLibrary/macs2/S10_peaks.narrowPeak");
        touch(root, "bwa/mergedLibrary/macs2/S1_peaks.broadPeak");

        let layout = PipelineLayout::default();
        let found = layout.locate_first(&layout.peaks, root, "S1").unwrap().unwrap();
        assert!(found.ends_with("S1_peaks.broadPeak"));

        let found = layout.locate_first(&layout.peaks, root, "S10").unwrap().unwrap();
        assert!(found.ends_with("S10_peaks.narrowPeak"));

        assert!(layout.locate_first(&layout.peaks, root, "S2").unwrap().is_none());
    }

    #[test]
    fn test_trim_log_prefers_report_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "trimgalore/logs/S1_1.fastq.gz_trimming_report.log");
        touch(root, "trimgalore/S1_1.fastq.gz_trimming_report.txt");

        let layout = PipelineLayout::default();
        let found = layout.locate_first(&layout.trim_logs, root, "S1").unwrap().unwrap();
        assert!(found.ends_with("trimgalore/S1_1.fastq.gz_trimming_report.txt"));
    }

    #[test]
    fn test_exact_lookup() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "bwa/mergedLibrary/S1.mLb.clN.sorted.bam.flagstat");

        let layout = PipelineLayout::default();
        assert!(layout.flagstat.locate(root, "S1").unwrap().is_some());
        assert!(layout.flagstat.locate(root, "S2").unwrap().is_none());
    }

    #[test]
    fn test_fastqc_report_discovery_and_naming() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "b/S2_R1_fastqc/fastqc_data.txt");
        touch(root, "a/S1_R1_fastqc/fastqc_data.txt");
        touch(root, "a/S1_R1_fastqc/summary.txt");

        let reports = discover_fastqc_reports(root);
        assert_eq!(reports.len(), 2);
        assert_eq!(fastqc_report_sample(&reports[0]), "S1_R1");
        assert_eq!(fastqc_report_sample(&reports[1]), "S2_R1");
    }

    #[test]
    fn test_require_dir() {
        let dir = TempDir::new().unwrap();
        assert!(require_dir(dir.path()).is_ok());
        assert!(matches!(
            require_dir(&dir.path().join("missing")),
            Err(QcError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_layout_round_trips_through_json() {
        let layout = PipelineLayout::default();
        let json = serde_json::to_string(&layout).unwrap();
        let back: PipelineLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layout);
    }
}
