use sluice_core::{Bridge, BridgePillar, FrictionType, StructureKind};

use crate::ini::Record;
use crate::structures::fields::{f64_or, keyword_or, optional_f64};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// Bridge, with pillars when both `pillarWidth` and `formFactor` are given.
///
/// The opening comes from the `csDefId` definition; without a usable one the
/// bridge is 50 m wide and 3 m high.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeParser;

impl StructureParser for BridgeParser {
    fn parse_kind(
        &self,
        record: &Record,
        _header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        let (width, height) = ctx
            .cross_section(record)
            .and_then(|definition| definition.shape.opening())
            .unwrap_or((Bridge::DEFAULT_WIDTH, Bridge::DEFAULT_HEIGHT));

        let pillar = match (
            optional_f64(record, "pillarWidth")?,
            optional_f64(record, "formFactor")?,
        ) {
            (Some(width), Some(form_factor)) => Some(BridgePillar { width, form_factor }),
            _ => None,
        };

        Ok(StructureKind::Bridge(Bridge {
            cross_section: record.value("csDefId").map(str::to_string),
            width,
            height,
            shift: f64_or(record, "shift", 0.0)?,
            length: f64_or(record, "length", 1.0)?,
            inlet_loss_coefficient: f64_or(record, "inletLossCoeff", 0.0)?,
            outlet_loss_coefficient: f64_or(record, "outletLossCoeff", 0.0)?,
            pillar,
            friction_type: keyword_or(record, "frictionType", FrictionType::Chezy)?,
            friction: f64_or(record, "friction", 45.0)?,
        }))
    }
}
