//! Reader for the sectioned key/value text format of structure files.
//!
//! ```text
//! [General]
//! fileVersion = 3.00
//!
//! [Structure]
//! id       = W1          # comment
//! branchId = B1
//! ```
//!
//! Keys are case-insensitive and may repeat; values stay raw strings until a
//! structure parser converts them.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sluice_core::{DiagnosticIssue, ImportDiagnostics};
use tracing::warn;

/// One `key = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// A named section with its properties in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Section header without brackets
    pub name: String,
    /// Line of the section header (1-based)
    pub line: usize,
    pub properties: Vec<Property>,
}

impl Record {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: &str, line: usize) -> Self {
        self.push(key, value, line);
        self
    }

    pub fn push(&mut self, key: &str, value: &str, line: usize) {
        self.properties.push(Property {
            key: key.to_string(),
            value: value.to_string(),
            line,
        });
    }

    pub fn is_section(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// First property with this key (case-insensitive).
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
    }

    /// Trimmed value of the first property with this key; blank values count as absent.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.property(key)
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Every property with this key, in file order.
    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.key.eq_ignore_ascii_case(key))
    }
}

/// Split text into records.
///
/// Lines outside a section and lines that are neither a header nor a
/// `key = value` pair are reported as warnings and ignored.
pub fn parse_records(text: &str, diagnostics: &mut ImportDiagnostics) -> Vec<Record> {
    let mut records: Vec<Record> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            records.push(Record::new(header.trim(), line_no));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            warn!(line = line_no, "Ignoring malformed line '{}'", line);
            diagnostics.push(
                DiagnosticIssue::warning("format", format!("Ignoring malformed line '{}'", line))
                    .with_line(line_no),
            );
            continue;
        };

        match records.last_mut() {
            Some(record) => record.push(key.trim(), value.trim(), line_no),
            None => {
                warn!(line = line_no, "Ignoring property '{}' outside of a section", key.trim());
                diagnostics.push(
                    DiagnosticIssue::warning(
                        "format",
                        format!("Ignoring property '{}' outside of a section", key.trim()),
                    )
                    .with_line(line_no),
                );
            }
        }
    }

    records
}

/// Read and split a structure file. Fails if the file cannot be read or has no sections.
pub fn read_records(path: &Path, diagnostics: &mut ImportDiagnostics) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading structure file {}", path.display()))?;
    let records = parse_records(&text, diagnostics);
    if records.is_empty() {
        bail!("structure file {} contains no sections", path.display());
    }
    Ok(records)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# leading comment
[General]
fileVersion = 3.00
fileType    = structure

[Structure]
id          = W1        # the weir
branchId    = B1
chainage    = 12.5
type        = weir
numLevels   = 2
yValues     = 0 1
yValues     = 2 3

[structure]
id =
"#;

    #[test]
    fn test_parse_sections_and_lines() {
        let mut diag = ImportDiagnostics::new();
        let records = parse_records(SAMPLE, &mut diag);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "General");
        assert_eq!(records[0].line, 3);
        assert!(records[1].is_section("STRUCTURE"));
        assert_eq!(records[1].line, 7);
        assert_eq!(records[1].value("ID"), Some("W1"));
        assert_eq!(records[1].property("chainage").map(|p| p.line), Some(10));
        assert!(!diag.has_errors());
        assert_eq!(diag.warning_count(), 0);
    }

    #[test]
    fn test_repeated_keys_are_kept_in_order() {
        let mut diag = ImportDiagnostics::new();
        let records = parse_records(SAMPLE, &mut diag);
        let rows: Vec<&str> = records[1].all("yvalues").map(|p| p.value.as_str()).collect();
        assert_eq!(rows, vec!["0 1", "2 3"]);
    }

    #[test]
    fn test_blank_value_is_absent() {
        let mut diag = ImportDiagnostics::new();
        let records = parse_records(SAMPLE, &mut diag);
        assert!(records[2].property("id").is_some());
        assert_eq!(records[2].value("id"), None);
    }

    #[test]
    fn test_stray_lines_are_warnings() {
        let mut diag = ImportDiagnostics::new();
        let records = parse_records("orphan = 1\n[Structure]\nnot a pair\n", &mut diag);
        assert_eq!(records.len(), 1);
        assert!(records[0].properties.is_empty());
        assert_eq!(diag.warning_count(), 2);
        assert_eq!(diag.issues[0].line, Some(1));
        assert_eq!(diag.issues[1].line, Some(3));
    }

    #[test]
    fn test_read_records_missing_file_is_fatal() {
        let mut diag = ImportDiagnostics::new();
        let err = read_records(Path::new("/definitely/not/here.ini"), &mut diag).unwrap_err();
        assert!(format!("{:#}", err).contains("reading structure file"));
    }

    #[test]
    fn test_read_records_without_sections_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ini");
        fs::write(&path, "# nothing here\n\n").unwrap();

        let mut diag = ImportDiagnostics::new();
        let err = read_records(&path, &mut diag).unwrap_err();
        assert!(err.to_string().contains("contains no sections"));
    }
}
