//! One-call import of a structure file into a network.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use sluice_core::{CrossSectionCatalogue, ImportDiagnostics, Network};
use thiserror::Error;
use tracing::info;

use crate::assembler::{attach_with, AttachSummary};
use crate::config::ImportConfig;
use crate::ini::read_records;
use crate::orchestrator::{ImportError, StructureReader};
use crate::timeseries::TimeSeriesResolver;

/// Raised by [`StructureImport::ensure_complete`] when any record failed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{} structure(s) could not be imported:\n{}", .messages.len(), .messages.join("\n"))]
pub struct AggregateImportError {
    pub messages: Vec<String>,
}

/// Outcome of [`import_structures`].
#[derive(Debug)]
pub struct StructureImport {
    pub summary: AttachSummary,
    pub errors: Vec<ImportError>,
    pub diagnostics: ImportDiagnostics,
}

impl StructureImport {
    /// Turn per-record failures into a single error.
    pub fn ensure_complete(&self) -> Result<(), AggregateImportError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(AggregateImportError {
            messages: self.errors.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Read the structure file at `path` and attach every accepted structure to `network`.
///
/// A missing or empty file and a broken placement are fatal. Failures of
/// single records are returned in [`StructureImport::errors`].
pub fn import_structures(
    path: &Path,
    network: &mut Network,
    cross_sections: &CrossSectionCatalogue,
    reference_time: NaiveDateTime,
    config: &ImportConfig,
) -> Result<StructureImport> {
    let mut diagnostics = ImportDiagnostics::new();
    let records = read_records(path, &mut diagnostics)?;

    let mut resolver = TimeSeriesResolver::standard()?;
    let read = {
        let branches = network.branch_lookup();
        StructureReader::new(&mut resolver, config).read(
            &records,
            &branches,
            cross_sections,
            path,
            reference_time,
        )
    };

    diagnostics.stats = read.diagnostics.stats.clone();
    diagnostics.merge(read.diagnostics);

    let summary = attach_with(read.structures, network, &config.placement())?;
    info!(
        "Imported {} structure(s) from {} ({})",
        diagnostics.stats.structures,
        path.display(),
        diagnostics.summary()
    );

    Ok(StructureImport {
        summary,
        errors: read.errors,
        diagnostics,
    })
}
