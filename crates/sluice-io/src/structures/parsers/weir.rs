use sluice_core::{StructureKind, UniversalWeir, Weir};

use crate::ini::Record;
use crate::structures::fields::{bool_or, counted_list, f64_or, optional_f64, required_f64, u32_or};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// Simple weir. The crest level may follow a time series.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeirParser;

impl StructureParser for WeirParser {
    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        Ok(StructureKind::Weir(Weir {
            crest_level: ctx.steerable(record, &header.name, "weir", "crestLevel", None)?,
            crest_width: optional_f64(record, "crestWidth")?,
            correction_coefficient: f64_or(record, "corrCoeff", 1.0)?,
            use_velocity_height: bool_or(record, "useVelocityHeight", true)?,
        }))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalWeirParser;

impl StructureParser for UniversalWeirParser {
    fn parse_kind(
        &self,
        record: &Record,
        _header: &StructureHeader,
        _ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        let levels = u32_or(record, "numLevels", 0)? as usize;
        if levels == 0 {
            return Err(StructureError::MissingProperty {
                key: "numLevels".to_string(),
                line: record.line,
            });
        }

        Ok(StructureKind::UniversalWeir(UniversalWeir {
            crest_level: required_f64(record, "crestLevel")?,
            y_values: counted_list(record, "numLevels", "yValues", levels)?,
            z_values: counted_list(record, "numLevels", "zValues", levels)?,
            discharge_coefficient: f64_or(record, "dischargeCoeff", 1.0)?,
            use_velocity_height: bool_or(record, "useVelocityHeight", true)?,
        }))
    }
}
