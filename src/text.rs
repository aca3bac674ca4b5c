//! Grammar helpers shared by the format parsers
//!
//! - Dual-count lines (`A + B label`) from alignment summaries
//! - Header/data tab tables from Picard-style metrics files
//! - Thousands-separated integers from trimming logs

/// One `A + B label` line. Only the QC-passed count `A` is kept; `B` must
/// still be an integer for the line to count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualCount<'a> {
    pub passed: u64,
    pub label: &'a str,
}

impl<'a> DualCount<'a> {
    /// Percentage in the parentheses right after the label word,
    /// e.g. `mapped (97.50% : N/A)` gives 97.5
    pub fn percent(&self) -> Option<f64> {
        let open = self.label.find('(')?;
        let rest = &self.label[open + 1..];
        let close = rest.find('%')?;
        let value: f64 = rest[..close].trim().parse().ok()?;
        (0.0..=100.0).contains(&value).then_some(value)
    }
}

/// Split a line of the form `<int> + <int> <label>`.
pub fn dual_count(line: &str) -> Option<DualCount<'_>> {
    let line = line.trim();
    let (passed, rest) = line.split_once(" + ")?;
    let (failed, label) = rest.split_once(' ')?;
    if failed.parse::<u64>().is_err() {
        return None;
    }
    Some(DualCount {
        passed: passed.trim().parse().ok()?,
        label: label.trim(),
    })
}

/// A header line and the data line immediately below it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderTable<'a> {
    pub header: Vec<&'a str>,
    pub values: Vec<&'a str>,
}

impl<'a> HeaderTable<'a> {
    /// Value under the named column, `None` when the column or the value is missing
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.header.iter().position(|h| *h == column)?;
        self.values
            .get(idx)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn get_u64(&self, column: &str) -> Option<u64> {
        self.get(column)?.parse().ok()
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column)?.parse().ok().filter(|v: &f64| v.is_finite())
    }
}

/// Locate the first line whose first tab-separated token is `marker` and pair it
/// with the following line.
///
/// Returns `None` when the marker is missing, when nothing follows it, or when
/// the data line has fewer than `min_columns` cells. Only the first marker line
/// is considered.
pub fn header_table<'a>(text: &'a str, marker: &str, min_columns: usize) -> Option<HeaderTable<'a>> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .find(|line| line.split('\t').next() == Some(marker))?;
    let data = lines.next()?.trim_end_matches('\r');

    let values: Vec<&str> = data.split('\t').collect();
    if values.len() < min_columns {
        return None;
    }
    Some(HeaderTable {
        header: header.trim_end_matches('\r').split('\t').collect(),
        values,
    })
}

/// Parse an integer that may carry `,` thousands separators
pub fn parse_grouped_u64(raw: &str) -> Option<u64> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Render an integer with `,` thousands separators
pub fn format_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dual_count_reports_first_integer() {
        let count = dual_count("1000 + 50 in total (QC-passed reads + QC-failed reads)").unwrap();
        assert_eq!(count.passed, 1000);
        assert!(count.label.starts_with("in total"));
    }

    #[test]
    fn test_dual_count_percent() {
        let count = dual_count("9750 + 0 mapped (97.50% : N/A)").unwrap();
        assert_eq!(count.percent(), Some(97.5));

        let count = dual_count("10 + 0 duplicates").unwrap();
        assert_eq!(count.percent(), None);
    }

    #[test]
    fn test_dual_count_rejects_other_lines() {
        assert!(dual_count("in total").is_none());
        assert!(dual_count("abc + 0 mapped").is_none());
        assert!(dual_count("").is_none());
    }

    #[test]
    fn test_header_table_pairs_next_line() {
        let text = "## METRICS CLASS\nLIBRARY\tA\tB\nlib1\t10\t\n\nLIBRARY\tA\tB\nlib2\t1\t2\n";
        let table = header_table(text, "LIBRARY", 3).unwrap();
        assert_eq!(table.get("A"), Some("10"));
        assert_eq!(table.get("B"), None);
        assert_eq!(table.get_u64("A"), Some(10));
        assert_eq!(table.get("C"), None);
    }

    #[test]
    fn test_header_table_too_few_columns_is_absent() {
        let text = "LIBRARY\tA\tB\nlib1\t10\n";
        assert!(header_table(text, "LIBRARY", 3).is_none());
        assert!(header_table("LIBRARY\tA\n", "LIBRARY", 1).is_none());
        assert!(header_table("nothing here", "LIBRARY", 1).is_none());
    }

    #[test]
    fn test_header_marker_must_be_first_token() {
        let text = "XLIBRARY\tA\n1\t2\n";
        assert!(header_table(text, "LIBRARY", 1).is_none());
    }

    #[test]
    fn test_grouped_integers() {
        assert_eq!(parse_grouped_u64("1,234,567"), Some(1_234_567));
        assert_eq!(parse_grouped_u64(" 42 "), Some(42));
        assert_eq!(parse_grouped_u64(","), None);
        assert_eq!(parse_grouped_u64("12a"), None);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(999_999), "999,999");
        assert_eq!(format_thousands(12_345_678), "12,345,678");
    }
}
