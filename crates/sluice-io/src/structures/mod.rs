//! Structure type dispatch and per-type parsers.
//!
//! [`get_parser`] maps a type tag from a structure record to a
//! [`StructureParser`]. Tags outside [`StructureType`] are
//! [`DispatchError::Unknown`]; known types without an implementation are
//! [`DispatchError::NoParser`]. The mapping is an exhaustive `match`, so adding
//! a structure type forces a decision here.

use std::path::Path;

use chrono::NaiveDateTime;
use sluice_core::{
    Branch, CrossSectionCatalogue, CrossSectionDefinition, FlowDirection, Steerable, Structure,
    StructureKind, StructureType,
};
use tracing::warn;

use crate::ini::Record;
use crate::timeseries::{TimeSeriesReference, TimeSeriesResolver};

mod error;
pub(crate) mod fields;
mod parsers;

pub use error::{DispatchError, StructureError};
pub use parsers::{
    BridgeParser, CompositeParser, CulvertParser, GeneralStructureParser, OrificeParser,
    PumpParser, UniversalWeirParser, WeirParser,
};

/// Everything a parser may consult besides the record itself.
pub struct ParseContext<'a> {
    /// Branch named by the record's `branchId`
    pub branch: &'a Branch,
    pub cross_sections: &'a CrossSectionCatalogue,
    /// Path of the structure file; relative time-series paths resolve against its directory
    pub file_path: &'a Path,
    pub reference_time: NaiveDateTime,
    pub resolver: &'a mut TimeSeriesResolver,
    /// Structures accepted earlier in the same run, in file order
    pub parsed: &'a [Structure],
}

impl<'a> ParseContext<'a> {
    /// Read a property that is either a constant or a time-series reference.
    ///
    /// The resolver is only consulted for file references. `default` applies
    /// when the key is absent. A file reference always yields a time series,
    /// empty when the file has no data for this structure and quantity.
    pub fn steerable(
        &mut self,
        record: &Record,
        structure_name: &str,
        quantity_prefix: &str,
        key: &str,
        default: Option<f64>,
    ) -> Result<Steerable, StructureError> {
        let Some(raw) = record.value(key) else {
            return default.map(Steerable::Constant).ok_or_else(|| {
                StructureError::MissingProperty {
                    key: key.to_string(),
                    line: record.line,
                }
            });
        };

        let path = match TimeSeriesReference::classify(raw) {
            TimeSeriesReference::Constant(value) => return Ok(Steerable::Constant(value)),
            TimeSeriesReference::File(path) => path,
        };
        let path = match self.file_path.parent() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        };

        let quantity = format!("{}_{}", quantity_prefix, key);
        let function = self
            .resolver
            .resolve(
                &path.to_string_lossy(),
                structure_name,
                &quantity,
                self.reference_time,
            )
            .map_err(|source| StructureError::TimeSeries {
                key: key.to_string(),
                source,
            })?;
        Ok(Steerable::TimeSeries(function))
    }

    /// The cross-section definition named by `csDefId`.
    ///
    /// `None` when the key is absent or names an unknown definition; callers
    /// then fall back to their default dimensions.
    pub fn cross_section(&self, record: &Record) -> Option<&'a CrossSectionDefinition> {
        let id = record.value("csDefId")?;
        let definition = self.cross_sections.get(id);
        if definition.is_none() {
            warn!(
                line = record.property("csDefId").map_or(record.line, |p| p.line),
                "Cross section definition '{}' does not exist, using default dimensions", id
            );
        }
        definition
    }
}

/// Properties shared by every structure record.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureHeader {
    pub name: String,
    pub long_name: String,
    pub branch: String,
    pub chainage: f64,
    pub flow_direction: FlowDirection,
}

impl StructureHeader {
    pub fn read(record: &Record, branch: &Branch) -> Result<Self, StructureError> {
        Ok(Self {
            name: fields::required_str(record, "id")?.to_string(),
            long_name: record.value("name").unwrap_or_default().to_string(),
            branch: branch.name.clone(),
            chainage: fields::required_f64(record, "chainage")?,
            flow_direction: fields::keyword_or(record, "allowedFlowDir", FlowDirection::Both)?,
        })
    }

    pub fn into_structure(self, kind: StructureKind) -> Structure {
        Structure::new(self.name, self.branch, self.chainage, kind)
            .with_long_name(self.long_name)
            .with_flow_direction(self.flow_direction)
    }
}

/// Converts one record into a structure of a single type.
pub trait StructureParser: Sync {
    fn parse(&self, record: &Record, ctx: &mut ParseContext<'_>) -> Result<Structure, StructureError> {
        let header = StructureHeader::read(record, ctx.branch)?;
        let kind = self.parse_kind(record, &header, ctx)?;
        Ok(header.into_structure(kind))
    }

    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError>;
}

static CULVERT: CulvertParser = CulvertParser::culvert();
static INVERTED_SIPHON: CulvertParser = CulvertParser::inverted_siphon();

/// Parser for a known structure type, `None` for types without one.
pub fn parser_for(structure_type: StructureType) -> Option<&'static dyn StructureParser> {
    match structure_type {
        StructureType::Weir => Some(&WeirParser),
        StructureType::UniversalWeir => Some(&UniversalWeirParser),
        StructureType::GeneralStructure => Some(&GeneralStructureParser),
        StructureType::Orifice => Some(&OrificeParser),
        StructureType::Pump => Some(&PumpParser),
        StructureType::Bridge => Some(&BridgeParser),
        StructureType::Culvert => Some(&CULVERT),
        StructureType::InvertedSiphon => Some(&INVERTED_SIPHON),
        StructureType::CompositeBranchStructure => Some(&CompositeParser),
        StructureType::RiverWeir
        | StructureType::AdvancedWeir
        | StructureType::Gate
        | StructureType::BridgePillar
        | StructureType::ExtraResistance
        | StructureType::Dambreak => None,
    }
}

/// Look up the parser for a type tag as written in a structure file.
pub fn get_parser(type_tag: &str) -> Result<&'static dyn StructureParser, DispatchError> {
    let structure_type: StructureType = type_tag
        .parse()
        .map_err(|_| DispatchError::Unknown(type_tag.trim().to_string()))?;
    parser_for(structure_type).ok_or(DispatchError::NoParser(structure_type))
}

/// The type tag of a record (`type`, or the older `definitionType`).
pub fn type_tag(record: &Record) -> Option<&str> {
    record.value("type").or_else(|| record.value("definitionType"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::Keyword;

    #[test]
    fn test_get_parser_distinguishes_unknown_and_unimplemented() {
        assert!(get_parser("weir").is_ok());
        assert!(get_parser("INVERTEDSIPHON").is_ok());
        assert_eq!(
            get_parser("sluiceGate").err(),
            Some(DispatchError::Unknown("sluiceGate".into()))
        );
        assert_eq!(
            get_parser("dambreak").err(),
            Some(DispatchError::NoParser(StructureType::Dambreak))
        );
    }

    #[test]
    fn test_every_type_is_decided() {
        let implemented: Vec<StructureType> = StructureType::VARIANTS
            .iter()
            .map(|(t, _)| *t)
            .filter(|t| parser_for(*t).is_some())
            .collect();
        assert_eq!(implemented.len(), 9);
    }

    #[test]
    fn test_type_tag_accepts_definition_type() {
        let record = Record::new("Structure", 1).with_property("definitionType", "pump", 2);
        assert_eq!(type_tag(&record), Some("pump"));
        let record = record.with_property("type", "weir", 3);
        assert_eq!(type_tag(&record), Some("weir"));
    }
}
