mod bridge;
mod composite;
mod culvert;
mod general;
mod orifice;
mod pump;
mod weir;

pub use bridge::BridgeParser;
pub use composite::CompositeParser;
pub use culvert::CulvertParser;
pub use general::GeneralStructureParser;
pub use orifice::OrificeParser;
pub use pump::PumpParser;
pub use weir::{UniversalWeirParser, WeirParser};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use chrono::{NaiveDate, NaiveDateTime};
    use geo::line_string;
    use sluice_core::{
        Branch, BranchId, CrossSectionCatalogue, CrossSectionDefinition, CrossSectionShape,
        Structure,
    };

    use crate::structures::{ParseContext, StructureError, StructureParser};
    use crate::timeseries::TimeSeriesResolver;
    use crate::ini::Record;

    pub fn reference_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    pub fn branch() -> Branch {
        Branch::new(
            BranchId::new(1),
            "B1",
            line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)],
        )
    }

    pub fn catalogue() -> CrossSectionCatalogue {
        vec![
            CrossSectionDefinition::new("round", CrossSectionShape::Circle { diameter: 1.0 }),
            CrossSectionDefinition::new(
                "box",
                CrossSectionShape::Rectangle {
                    width: 2.0,
                    height: 1.0,
                    closed: true,
                },
            ),
        ]
        .into_iter()
        .collect()
    }

    /// Build a structure record from `key = value` pairs (line numbers start at 2).
    pub fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .enumerate()
            .fold(Record::new("Structure", 1), |r, (i, (k, v))| {
                r.with_property(k, v, i + 2)
            })
    }

    pub fn parse_with(
        parser: &dyn StructureParser,
        record: &Record,
        parsed: &[Structure],
        file_path: &Path,
    ) -> Result<Structure, StructureError> {
        let branch = branch();
        let catalogue = catalogue();
        let mut resolver = TimeSeriesResolver::standard().unwrap();
        let mut ctx = ParseContext {
            branch: &branch,
            cross_sections: &catalogue,
            file_path,
            reference_time: reference_time(),
            resolver: &mut resolver,
            parsed,
        };
        parser.parse(record, &mut ctx)
    }

    pub fn parse(parser: &dyn StructureParser, record: &Record) -> Result<Structure, StructureError> {
        parse_with(parser, record, &[], Path::new("structures.ini"))
    }
}
