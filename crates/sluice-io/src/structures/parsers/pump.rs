use sluice_core::{Pump, PumpControlSide, PumpOrientation, StructureKind};

use crate::ini::Record;
use crate::structures::fields::{f64_or, keyword_or, table, u32_or};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// Pump with start/stop levels per side and an optional capacity reduction table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpParser;

impl StructureParser for PumpParser {
    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        Ok(StructureKind::Pump(Pump {
            orientation: keyword_or(record, "orientation", PumpOrientation::Positive)?,
            control_side: keyword_or(record, "controlSide", PumpControlSide::SuctionSide)?,
            num_stages: u32_or(record, "numStages", 1)?,
            capacity: ctx.steerable(record, &header.name, "pump", "capacity", None)?,
            start_level_suction_side: f64_or(record, "startLevelSuctionSide", 0.0)?,
            stop_level_suction_side: f64_or(record, "stopLevelSuctionSide", 0.0)?,
            start_level_delivery_side: f64_or(record, "startLevelDeliverySide", 0.0)?,
            stop_level_delivery_side: f64_or(record, "stopLevelDeliverySide", 0.0)?,
            reduction_table: table(record, "numReductionLevels", "head", "reductionFactor")?,
        }))
    }
}
