//! Reads all structure records of one file.
//!
//! Records are processed strictly in file order. A record whose branch is
//! blank or unknown is skipped without an error. Any other failure becomes an
//! [`ImportError`] for that record and processing continues with the next one.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use sluice_core::{Branch, CrossSectionCatalogue, DiagnosticIssue, ImportDiagnostics, Structure};
use tracing::{debug, error, warn};

use crate::config::ImportConfig;
use crate::ini::Record;
use crate::legacy;
use crate::structures::{get_parser, type_tag, ParseContext, StructureError};
use crate::timeseries::TimeSeriesResolver;

/// Failure of one structure record.
#[derive(Debug)]
pub struct ImportError {
    /// Structure id, if the record has one
    pub name: Option<String>,
    /// Line of the record's section header
    pub line: usize,
    pub cause: StructureError,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "structure '{}' (line {}): {}", name, self.line, self.cause),
            None => write!(f, "structure at line {}: {}", self.line, self.cause),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Accepted structures and per-record failures of one run.
#[derive(Debug, Default)]
pub struct StructureReadResult {
    pub structures: Vec<Structure>,
    pub errors: Vec<ImportError>,
    pub diagnostics: ImportDiagnostics,
}

impl StructureReadResult {
    /// One line per failed record.
    pub fn error_report(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// State threaded through the fold over records.
#[derive(Default)]
struct Accumulator {
    structures: Vec<Structure>,
    names: HashSet<String>,
    errors: Vec<ImportError>,
    skipped: usize,
}

pub struct StructureReader<'a> {
    resolver: &'a mut TimeSeriesResolver,
    config: &'a ImportConfig,
}

impl<'a> StructureReader<'a> {
    pub fn new(resolver: &'a mut TimeSeriesResolver, config: &'a ImportConfig) -> Self {
        Self { resolver, config }
    }

    pub fn read(
        &mut self,
        records: &[Record],
        branches: &HashMap<String, &Branch>,
        cross_sections: &CrossSectionCatalogue,
        file_path: &Path,
        reference_time: NaiveDateTime,
    ) -> StructureReadResult {
        let mut diagnostics = ImportDiagnostics::new();

        let records = if self.config.normalize_legacy {
            let normalized = legacy::normalize(records.to_vec());
            diagnostics.stats.removed_properties = normalized.removed.len();
            diagnostics.extend(normalized.removed.iter().map(|d| d.to_issue()));
            normalized.records
        } else {
            records.to_vec()
        };

        let structure_records: Vec<&Record> = records
            .iter()
            .filter(|record| {
                if record.is_section(&self.config.structure_section) {
                    return true;
                }
                if !record.is_section("General") {
                    let message = format!(
                        "Section [{}] is not a structure definition and is skipped",
                        record.name
                    );
                    warn!(line = record.line, "{}", message);
                    diagnostics.push(
                        DiagnosticIssue::warning("section", message).with_line(record.line),
                    );
                }
                false
            })
            .collect();
        diagnostics.stats.records = structure_records.len();

        let acc = structure_records
            .into_iter()
            .fold(Accumulator::default(), |acc, record| {
                self.step(acc, record, branches, cross_sections, file_path, reference_time)
            });

        diagnostics.stats.structures = acc.structures.len();
        diagnostics.stats.skipped_records = acc.skipped;
        diagnostics.stats.failed_records = acc.errors.len();
        diagnostics.extend(self.resolver.take_issues());
        diagnostics.extend(acc.errors.iter().map(|e| {
            let issue = DiagnosticIssue::error("structure", e.cause.to_string()).with_line(e.line);
            match &e.name {
                Some(name) => issue.with_entity(name.clone()),
                None => issue,
            }
        }));

        let result = StructureReadResult {
            structures: acc.structures,
            errors: acc.errors,
            diagnostics,
        };
        if !result.errors.is_empty() {
            error!(
                "{} structure(s) in {} could not be imported:\n{}",
                result.errors.len(),
                file_path.display(),
                result.error_report()
            );
        }
        result
    }

    fn step(
        &mut self,
        mut acc: Accumulator,
        record: &Record,
        branches: &HashMap<String, &Branch>,
        cross_sections: &CrossSectionCatalogue,
        file_path: &Path,
        reference_time: NaiveDateTime,
    ) -> Accumulator {
        let name = record.value("id").map(str::to_string);

        let Some(branch) = record
            .value("branchId")
            .and_then(|branch_id| branches.get(branch_id))
        else {
            debug!(
                line = record.line,
                structure = name.as_deref().unwrap_or(""),
                "Skipping structure without a known branch"
            );
            acc.skipped += 1;
            return acc;
        };

        let parsed = type_tag(record)
            .ok_or(StructureError::MissingType)
            .and_then(|tag| get_parser(tag).map_err(StructureError::from))
            .and_then(|parser| {
                let mut ctx = ParseContext {
                    branch,
                    cross_sections,
                    file_path,
                    reference_time,
                    resolver: &mut *self.resolver,
                    parsed: &acc.structures,
                };
                parser.parse(record, &mut ctx)
            })
            .and_then(|structure| {
                if acc.names.contains(&structure.name) {
                    Err(StructureError::DuplicateName {
                        name: structure.name,
                    })
                } else {
                    Ok(structure)
                }
            });

        match parsed {
            Ok(structure) => {
                acc.names.insert(structure.name.clone());
                acc.structures.push(structure);
            }
            Err(cause) => acc.errors.push(ImportError {
                name,
                line: record.line,
                cause,
            }),
        }
        acc
    }
}
