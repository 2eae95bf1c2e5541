//! Operation report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

/// Aggregate counters and diagnostics for one dispatched operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportFs {
    /// Number of concrete sources the specifier resolved to.
    pub cnt_resolved: u64,
    /// Number of sources copied.
    pub cnt_copied: u64,
    /// Number of sources left untouched by policy (`IGNORE`, stale `UPDATE`,
    /// non-empty directory under `RM_EMPTY`).
    pub cnt_skipped: u64,
    /// Number of sources removed.
    pub cnt_removed: u64,
    /// Number of sources moved.
    pub cnt_moved: u64,
    /// Non-fatal warnings (external copy fallback, metadata not preserved).
    pub warnings: Vec<String>,
}

impl ReportFs {
    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_resolved".to_string(), self.cnt_resolved);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_removed".to_string(), self.cnt_removed);
        dict_counts.insert("cnt_moved".to_string(), self.cnt_moved);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} resolved={} copied={} skipped={} removed={} moved={} warnings={}",
            dict_counts["cnt_resolved"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_removed"],
            dict_counts["cnt_moved"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FS]"))
    }
}

/// Mutable accumulator threaded through the per-item operations.
#[derive(Debug, Default, Clone)]
pub struct ReportFsBuilder {
    /// See [`ReportFs::cnt_resolved`].
    pub cnt_resolved: u64,
    /// See [`ReportFs::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportFs::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportFs::cnt_removed`].
    pub cnt_removed: u64,
    /// See [`ReportFs::cnt_moved`].
    pub cnt_moved: u64,
    /// See [`ReportFs::warnings`].
    pub warnings: Vec<String>,
}

impl ReportFsBuilder {
    /// Increment one or more named counters by `value`.
    ///
    /// Unknown names are ignored.
    pub fn add_counts(&mut self, field_names: &[&str], value: u64) {
        for field_name in field_names {
            match *field_name {
                "cnt_resolved" => self.cnt_resolved += value,
                "cnt_copied" => self.cnt_copied += value,
                "cnt_skipped" => self.cnt_skipped += value,
                "cnt_removed" => self.cnt_removed += value,
                "cnt_moved" => self.cnt_moved += value,
                _ => {}
            }
        }
    }

    pub fn add_resolved(&mut self) {
        self.cnt_resolved += 1;
    }

    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    pub fn add_removed(&mut self) {
        self.cnt_removed += 1;
    }

    pub fn add_moved(&mut self) {
        self.cnt_moved += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportFs {
        ReportFs {
            cnt_resolved: self.cnt_resolved,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            cnt_removed: self.cnt_removed,
            cnt_moved: self.cnt_moved,
            warnings: self.warnings,
        }
    }
}
