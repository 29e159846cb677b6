use sluice_core::{
    Culvert, CulvertGeometryKind, CulvertSubType, CulvertValve, FrictionType, StructureKind,
};

use crate::ini::Record;
use crate::structures::fields::{bool_or, f64_or, keyword_or, table};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// Culvert, also used for inverted siphons.
///
/// For the `invertedSiphon` tag the sub type is fixed; for `culvert` it comes
/// from the `subType` property. Geometry and dimensions follow the `csDefId`
/// definition; a culvert without one is tabulated.
#[derive(Debug, Clone, Copy, Default)]
pub struct CulvertParser {
    forced_sub_type: Option<CulvertSubType>,
}

impl CulvertParser {
    pub const fn culvert() -> Self {
        Self {
            forced_sub_type: None,
        }
    }

    pub const fn inverted_siphon() -> Self {
        Self {
            forced_sub_type: Some(CulvertSubType::InvertedSiphon),
        }
    }
}

impl StructureParser for CulvertParser {
    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        let sub_type = match self.forced_sub_type {
            Some(sub_type) => sub_type,
            None => keyword_or(record, "subType", CulvertSubType::Culvert)?,
        };

        let definition = ctx.cross_section(record);
        let geometry_kind = definition.map_or(CulvertGeometryKind::Tabulated, |d| {
            d.shape.culvert_geometry_kind()
        });
        let dimensions = definition
            .map(|d| d.shape.culvert_dimensions())
            .unwrap_or_default();

        let valve = if bool_or(record, "valveOnOff", false)? {
            Some(CulvertValve {
                opening_height: ctx.steerable(
                    record,
                    &header.name,
                    "culvert",
                    "valveOpeningHeight",
                    Some(0.0),
                )?,
                loss_table: table(record, "numLossCoeff", "relOpening", "lossCoeff")?,
            })
        } else {
            None
        };

        let bend_loss_coefficient = match sub_type {
            CulvertSubType::InvertedSiphon => Some(f64_or(record, "bendLossCoeff", 1.0)?),
            CulvertSubType::Culvert => None,
        };

        Ok(StructureKind::Culvert(Culvert {
            sub_type,
            cross_section: record.value("csDefId").map(str::to_string),
            geometry_kind,
            dimensions,
            left_level: f64_or(record, "leftLevel", 0.0)?,
            right_level: f64_or(record, "rightLevel", 0.0)?,
            length: f64_or(record, "length", 1.0)?,
            inlet_loss_coefficient: f64_or(record, "inletLossCoeff", 0.0)?,
            outlet_loss_coefficient: f64_or(record, "outletLossCoeff", 0.0)?,
            valve,
            friction_type: keyword_or(record, "bedFrictionType", FrictionType::Chezy)?,
            friction: f64_or(record, "bedFriction", 45.0)?,
            bend_loss_coefficient,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::parsers::test_support::{parse, record};
    use sluice_core::{CulvertDimensions, Steerable};

    fn culvert_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("id", "C1"),
            ("branchId", "B1"),
            ("chainage", "40"),
            ("csDefId", "round"),
            ("leftLevel", "-1"),
            ("rightLevel", "-1.2"),
            ("length", "12"),
            ("inletLossCoeff", "0.5"),
            ("outletLossCoeff", "0.8"),
        ]
    }

    #[test]
    fn test_culvert_without_valve() {
        let s = parse(&CulvertParser::culvert(), &record(&culvert_pairs())).unwrap();
        let StructureKind::Culvert(c) = s.kind else {
            panic!("expected a culvert");
        };
        assert_eq!(c.sub_type, CulvertSubType::Culvert);
        assert_eq!(c.geometry_kind, CulvertGeometryKind::Round);
        assert_eq!(c.friction_type, FrictionType::Chezy);
        assert_eq!(c.friction, 45.0);
        assert!(c.valve.is_none());
        assert!(c.bend_loss_coefficient.is_none());
    }

    #[test]
    fn test_culvert_with_valve() {
        let mut pairs = culvert_pairs();
        pairs.extend([
            ("valveOnOff", "1"),
            ("valveOpeningHeight", "0.6"),
            ("numLossCoeff", "2"),
            ("relOpening", "0.5 1"),
            ("lossCoeff", "2 0"),
            ("bedFrictionType", "Manning"),
            ("bedFriction", "0.013"),
        ]);
        let StructureKind::Culvert(c) = parse(&CulvertParser::culvert(), &record(&pairs))
            .unwrap()
            .kind
        else {
            panic!("expected a culvert");
        };
        let valve = c.valve.unwrap();
        assert_eq!(valve.opening_height, Steerable::Constant(0.6));
        assert_eq!(valve.loss_table, vec![(0.5, 2.0), (1.0, 0.0)]);
        assert_eq!(c.friction_type, FrictionType::Manning);
    }

    #[test]
    fn test_inverted_siphon_bend_loss() {
        let s = parse(&CulvertParser::inverted_siphon(), &record(&culvert_pairs())).unwrap();
        let StructureKind::Culvert(c) = s.kind else {
            panic!("expected a culvert");
        };
        assert_eq!(c.sub_type, CulvertSubType::InvertedSiphon);
        assert_eq!(c.bend_loss_coefficient, Some(1.0));

        let mut pairs = culvert_pairs();
        pairs.push(("bendLossCoeff", "0.3"));
        let s = parse(&CulvertParser::inverted_siphon(), &record(&pairs)).unwrap();
        let StructureKind::Culvert(c) = s.kind else {
            panic!("expected a culvert");
        };
        assert_eq!(c.bend_loss_coefficient, Some(0.3));
    }

    #[test]
    fn test_dimensions_come_from_the_profile() {
        let mut pairs = culvert_pairs();
        pairs[3] = ("csDefId", "box");
        let StructureKind::Culvert(c) = parse(&CulvertParser::culvert(), &record(&pairs))
            .unwrap()
            .kind
        else {
            panic!("expected a culvert");
        };
        assert_eq!(c.geometry_kind, CulvertGeometryKind::Rectangle);
        assert_eq!((c.dimensions.width, c.dimensions.height), (2.0, 1.0));
        assert!(c.dimensions.closed);

        let StructureKind::Culvert(c) = parse(&CulvertParser::culvert(), &record(&culvert_pairs()))
            .unwrap()
            .kind
        else {
            panic!("expected a culvert");
        };
        assert_eq!(c.dimensions.diameter, Some(1.0));
    }

    #[test]
    fn test_without_cross_section_is_tabulated() {
        let bare = record(&[
            ("id", "C9"),
            ("name", "LongNameOfStructure"),
            ("branchId", "B1"),
            ("chainage", "123"),
            ("allowedFlowDir", "both"),
            ("bedFrictionType", "Chezy"),
        ]);
        let s = parse(&CulvertParser::culvert(), &bare).unwrap();
        assert_eq!(s.long_name, "LongNameOfStructure");
        let StructureKind::Culvert(c) = s.kind else {
            panic!("expected a culvert");
        };
        assert_eq!(c.cross_section, None);
        assert_eq!(c.geometry_kind, CulvertGeometryKind::Tabulated);
        assert_eq!(c.dimensions, CulvertDimensions::default());
        assert_eq!((c.left_level, c.right_level, c.length), (0.0, 0.0, 1.0));

        let mut pairs = culvert_pairs();
        pairs[3] = ("csDefId", "egg_missing");
        let StructureKind::Culvert(c) = parse(&CulvertParser::culvert(), &record(&pairs))
            .unwrap()
            .kind
        else {
            panic!("expected a culvert");
        };
        assert_eq!(c.cross_section.as_deref(), Some("egg_missing"));
        assert_eq!(c.geometry_kind, CulvertGeometryKind::Tabulated);
    }
}
