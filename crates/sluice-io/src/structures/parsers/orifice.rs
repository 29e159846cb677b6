use sluice_core::{Orifice, StructureKind};

use crate::ini::Record;
use crate::structures::fields::{bool_or, f64_or, optional_f64, required_f64};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrificeParser;

/// Flow limit that only applies when its `use...` flag is set.
fn flow_limit(record: &Record, flag: &str, key: &str) -> Result<Option<f64>, StructureError> {
    if bool_or(record, flag, false)? {
        required_f64(record, key).map(Some)
    } else {
        Ok(None)
    }
}

impl StructureParser for OrificeParser {
    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        Ok(StructureKind::Orifice(Orifice {
            crest_level: ctx.steerable(record, &header.name, "orifice", "crestLevel", None)?,
            crest_width: optional_f64(record, "crestWidth")?,
            gate_lower_edge_level: ctx.steerable(
                record,
                &header.name,
                "orifice",
                "gateLowerEdgeLevel",
                None,
            )?,
            correction_coefficient: f64_or(record, "corrCoeff", 1.0)?,
            limit_flow_pos: flow_limit(record, "useLimitFlowPos", "limitFlowPos")?,
            limit_flow_neg: flow_limit(record, "useLimitFlowNeg", "limitFlowNeg")?,
            use_velocity_height: bool_or(record, "useVelocityHeight", true)?,
        }))
    }
}
