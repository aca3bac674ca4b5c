//! FastQC `fastqc_data.txt` parsing
//!
//! The report is a sequence of modules:
//!
//! ```text
//! >>Basic Statistics	pass
//! #Measure	Value
//! Total Sequences	1000000
//! >>END_MODULE
//! ```
//!
//! Only the modules the quality rules look at are read in detail; every
//! module's status is recorded.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const BASIC_STATISTICS: &str = "Basic Statistics";
pub const PER_BASE_QUALITY: &str = "Per base sequence quality";
pub const ADAPTER_CONTENT: &str = "Adapter Content";

const MODULE_MARKER: &str = ">>";
const MODULE_END: &str = ">>END_MODULE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Pass,
    Warn,
    Fail,
}

impl FromStr for ModuleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pass" => Ok(Self::Pass),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown module status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub name: String,
    pub status: ModuleStatus,
}

/// Mean quality at one position (or position range, e.g. `10-14`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseQuality {
    pub position: String,
    pub mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastQcRecord {
    /// Basic Statistics rows, kept verbatim
    pub basic_stats: BTreeMap<String, String>,
    pub per_base_quality: Vec<BaseQuality>,
    /// Module statuses in report order
    pub modules: Vec<ModuleResult>,
    /// Highest adapter percentage in any position/adapter cell
    pub adapter_max_pct: Option<f64>,
}

impl FastQcRecord {
    /// Parse a report. Returns `None` if the text contains no module header at all.
    pub fn parse(text: &str) -> Option<Self> {
        let mut record = Self::default();
        let mut current: Option<String> = None;
        let mut saw_module = false;

        for line in text.lines() {
            let line = line.trim();

            if line.starts_with(MODULE_END) {
                current = None;
                continue;
            }
            if let Some(header) = line.strip_prefix(MODULE_MARKER) {
                let mut fields = header.split('\t');
                let name = fields.next().unwrap_or_default().to_string();
                if let Some(status) = fields.next().and_then(|s| s.parse().ok()) {
                    record.set_status(&name, status);
                }
                saw_module = true;
                current = Some(name);
                continue;
            }
            if line.starts_with('#') || !line.contains('\t') {
                continue;
            }

            match current.as_deref() {
                Some(BASIC_STATISTICS) => record.read_basic_stat(line),
                Some(PER_BASE_QUALITY) => record.read_base_quality(line),
                Some(ADAPTER_CONTENT) => record.read_adapter_row(line),
                _ => {}
            }
        }

        saw_module.then_some(record)
    }

    pub fn status(&self, module: &str) -> Option<ModuleStatus> {
        self.modules
            .iter()
            .find(|m| m.name == module)
            .map(|m| m.status)
    }

    pub fn basic_stat(&self, key: &str) -> Option<&str> {
        self.basic_stats.get(key).map(String::as_str)
    }

    fn set_status(&mut self, name: &str, status: ModuleStatus) {
        match self.modules.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.status = status,
            None => self.modules.push(ModuleResult {
                name: name.to_string(),
                status,
            }),
        }
    }

    fn read_basic_stat(&mut self, line: &str) {
        let mut parts = line.split('\t');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            self.basic_stats.insert(key.to_string(), value.to_string());
        }
    }

    fn read_base_quality(&mut self, line: &str) {
        let mut parts = line.split('\t');
        let (Some(position), Some(mean)) = (parts.next(), parts.next()) else {
            return;
        };
        if let Ok(mean) = mean.trim().parse::<f64>() {
            self.per_base_quality.push(BaseQuality {
                position: position.to_string(),
                mean,
            });
        }
    }

    fn read_adapter_row(&mut self, line: &str) {
        let row_max = line
            .split('\t')
            .skip(1)
            .filter_map(|cell| cell.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

        if let Some(v) = row_max {
            self.adapter_max_pct = Some(self.adapter_max_pct.map_or(v, |m| m.max(v)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const REPORT: &str = indoc! {"
        ##FastQC\t0.11.9
        >>Basic Statistics\tpass
        #Measure\tValue
        Filename\tS1_R1.fastq.gz
        Total Sequences\t25000000
        Sequences flagged as poor quality\t0
        Sequence length\t35-151
        %GC\t46
        >>END_MODULE
        >>Per base sequence quality\twarn
        #Base\tMean\tMedian
        1\t32.1\t33.0
        2\t32.4\t33.0
        10-14\t27.5\t28.0
        >>END_MODULE
        >>Per base sequence content\tfail
        #Base\tG\tA\tT\tC
        1\t40.0\t10.0\t10.0\t40.0
        >>END_MODULE
        >>Adapter Content\tfail
        #Position\tIllumina Universal Adapter\tNextera Transposase Sequence
        1\t0.0\t0.5
        10-14\t1.2\t14.75
        15-19\tNaN\t3.0
        >>END_MODULE
    "};

    #[test]
    fn test_parse_modules_and_statuses() {
        let record = FastQcRecord::parse(REPORT).unwrap();
        let names: Vec<&str> = record.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![BASIC_STATISTICS, PER_BASE_QUALITY, "Per base sequence content", ADAPTER_CONTENT]
        );
        assert_eq!(record.status(BASIC_STATISTICS), Some(ModuleStatus::Pass));
        assert_eq!(record.status(PER_BASE_QUALITY), Some(ModuleStatus::Warn));
        assert_eq!(record.status(ADAPTER_CONTENT), Some(ModuleStatus::Fail));
        assert_eq!(record.status("Kmer Content"), None);
    }

    #[test]
    fn test_basic_stats_are_verbatim_strings() {
        let record = FastQcRecord::parse(REPORT).unwrap();
        assert_eq!(record.basic_stat("Sequence length"), Some("35-151"));
        assert_eq!(record.basic_stat("%GC"), Some("46"));
        assert_eq!(record.basic_stat("Total Sequences"), Some("25000000"));
        assert!(record.basic_stat("#Measure").is_none());
    }

    #[test]
    fn test_per_base_quality_in_order() {
        let record = FastQcRecord::parse(REPORT).unwrap();
        let positions: Vec<&str> = record
            .per_base_quality
            .iter()
            .map(|b| b.position.as_str())
            .collect();
        assert_eq!(positions, vec!["1", "2", "10-14"]);
        assert_eq!(record.per_base_quality[2].mean, 27.5);
    }

    #[test]
    fn test_adapter_maximum_across_cells() {
        let record = FastQcRecord::parse(REPORT).unwrap();
        assert_eq!(record.adapter_max_pct, Some(14.75));
    }

    #[test]
    fn test_unknown_status_still_opens_module() {
        let text = ">>Basic Statistics\n%GC\t50\n>>END_MODULE\n";
        let record = FastQcRecord::parse(text).unwrap();
        assert!(record.modules.is_empty());
        assert_eq!(record.basic_stat("%GC"), Some("50"));
    }

    #[test]
    fn test_lines_outside_modules_are_ignored() {
        let text = "Total Sequences\t5\n>>Basic Statistics\tpass\n>>END_MODULE\n%GC\t50\n";
        let record = FastQcRecord::parse(text).unwrap();
        assert!(record.basic_stats.is_empty());
    }

    #[test]
    fn test_text_without_modules_is_absent() {
        assert!(FastQcRecord::parse("").is_none());
        assert!(FastQcRecord::parse("Filename\tS1.fastq\n").is_none());
    }

    #[test]
    fn test_no_adapter_module_means_no_maximum() {
        let text = ">>Basic Statistics\tpass\n>>END_MODULE\n";
        assert_eq!(FastQcRecord::parse(text).unwrap().adapter_max_pct, None);
    }
}
