//! # sluice-io: Structure File Import
//!
//! Reads structure definition files (weirs, pumps, culverts, bridges,
//! orifices, compounds), resolves time-dependent properties from `.tim` and
//! `.bc` files, and attaches the parsed structures to a
//! [`sluice_core::Network`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use chrono::NaiveDate;
//! use sluice_core::{CrossSectionCatalogue, Network};
//! use sluice_io::{import_structures, ImportConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut network = Network::new();
//!     let reference_time = NaiveDate::from_ymd_opt(2022, 5, 5)
//!         .and_then(|d| d.and_hms_opt(0, 0, 0))
//!         .ok_or_else(|| anyhow::anyhow!("invalid reference time"))?;
//!
//!     let import = import_structures(
//!         Path::new("model/structures.ini"),
//!         &mut network,
//!         &CrossSectionCatalogue::new(),
//!         reference_time,
//!         &ImportConfig::default(),
//!     )?;
//!
//!     println!("{}", import.diagnostics.summary());
//!     import.ensure_complete()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! 1. **Reading** ([`ini`]) - split the file into section records
//! 2. **Normalization** ([`legacy`]) - drop and rename obsolete properties
//! 3. **Parsing** ([`structures`]) - dispatch each record to a per-type parser,
//!    resolving time series through [`timeseries::TimeSeriesResolver`]
//! 4. **Orchestration** ([`orchestrator`]) - process records in file order,
//!    collecting per-record failures instead of aborting
//! 5. **Assembly** ([`assembler`]) - place structures into compounds on their branches
//!
//! [`writer`] renders structures back into the same file format.
//!
//! ## Error Handling
//!
//! A missing or empty file is fatal (`anyhow::Result`). A broken record is
//! not: it becomes an [`ImportError`] and the other records still import.
//! [`StructureImport::ensure_complete`] turns collected failures into one
//! error after the accepted structures have been attached.

pub mod assembler;
pub mod config;
pub mod import;
pub mod ini;
pub mod legacy;
pub mod orchestrator;
pub mod structures;
pub mod timeseries;
pub mod writer;

pub use assembler::{attach, attach_with, AttachSummary};
pub use config::ImportConfig;
pub use import::{import_structures, AggregateImportError, StructureImport};
pub use orchestrator::{ImportError, StructureReadResult, StructureReader};
pub use timeseries::{TimeSeriesError, TimeSeriesResolver};
pub use writer::{Rendered, StructureWriter};
