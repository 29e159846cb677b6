//! Diagnostics collected while importing structure files.
//!
//! Every soft failure of an import (a removed legacy property, a skipped
//! section, a time series that could not be found) is logged through
//! `tracing` and also recorded here so callers can report it after the run.
//!
//! # Example
//!
//! ```
//! use sluice_core::diagnostics::{DiagnosticIssue, ImportDiagnostics, Severity};
//!
//! let mut diag = ImportDiagnostics::new();
//! diag.push(
//!     DiagnosticIssue::warning("legacy", "Removed property 'compound'")
//!         .with_line(12)
//!         .with_entity("W1"),
//! );
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.summary(), "1 warning");
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Processing continued (property dropped, record skipped, default used)
    Warning,
    /// A record could not be imported
    Error,
}

/// A single issue encountered during an import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "legacy", "section", "timeseries", "structure")
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Structure or record name the issue belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            line: None,
            entity: None,
        }
    }

    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }

        Ok(())
    }
}

/// Counters for one structure import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Structure sections seen in the file
    pub records: usize,
    /// Structures accepted by the reader
    pub structures: usize,
    /// Records skipped because their branch was blank or unknown
    pub skipped_records: usize,
    /// Records that produced an import error
    pub failed_records: usize,
    /// Legacy properties removed by the normalizer
    pub removed_properties: usize,
}

/// Statistics plus issues for one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportDiagnostics {
    pub stats: ImportStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = DiagnosticIssue>) {
        self.issues.extend(issues);
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Merge issues from another run (stats are left untouched)
    pub fn merge(&mut self, other: ImportDiagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
        }

        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => plural(w, "warning"),
            (0, e) => plural(e, "error"),
            (w, e) => format!("{}, {}", plural(w, "warning"), plural(e, "error")),
        }
    }
}

impl std::fmt::Display for ImportDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Imported {} of {} structure records ({} skipped, {} failed): {}",
            self.stats.structures,
            self.stats.records,
            self.stats.skipped_records,
            self.stats.failed_records,
            self.summary()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = DiagnosticIssue::warning("legacy", "Removed property 'polylinefile'")
            .with_entity("W1")
            .with_line(7);
        assert_eq!(
            issue.to_string(),
            "[warning:legacy] Removed property 'polylinefile' (W1) at line 7"
        );
    }

    #[test]
    fn test_counts_and_summary() {
        let mut diag = ImportDiagnostics::new();
        assert_eq!(diag.summary(), "No issues");

        diag.push(DiagnosticIssue::warning("section", "skipped"));
        diag.push(DiagnosticIssue::warning("timeseries", "empty"));
        diag.push(DiagnosticIssue::error("structure", "unknown type"));

        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.error_count(), 1);
        assert!(diag.has_errors());
        assert_eq!(diag.summary(), "2 warnings, 1 error");
        assert_eq!(diag.issues_by_category("timeseries").count(), 1);
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let mut diag = ImportDiagnostics::new();
        diag.stats.records = 2;
        diag.push(DiagnosticIssue::warning("section", "Skipped [Lateral]"));

        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["stats"]["records"], 2);
        assert_eq!(json["issues"][0]["severity"], "warning");
        assert!(json["issues"][0].get("line").is_none());

        let empty = serde_json::to_value(ImportDiagnostics::new()).unwrap();
        assert!(empty.get("issues").is_none());
    }
}
