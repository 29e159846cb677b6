use sluice_core::{
    FlowCoefficients, GateOpeningDirection, GeneralStructure, GeneralStructureGeometry,
    StructureKind,
};

use crate::ini::Record;
use crate::structures::fields::{bool_or, f64_or, keyword_or, optional_f64};
use crate::structures::{ParseContext, StructureError, StructureHeader, StructureParser};

/// General structure (weir and gate combined, with approach/departure sections).
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralStructureParser;

const QUANTITY: &str = "generalStructure";

fn read_geometry(record: &Record) -> Result<GeneralStructureGeometry, StructureError> {
    Ok(GeneralStructureGeometry {
        upstream1_width: optional_f64(record, "upstream1Width")?,
        upstream1_level: optional_f64(record, "upstream1Level")?,
        upstream2_width: optional_f64(record, "upstream2Width")?,
        upstream2_level: optional_f64(record, "upstream2Level")?,
        downstream1_width: optional_f64(record, "downstream1Width")?,
        downstream1_level: optional_f64(record, "downstream1Level")?,
        downstream2_width: optional_f64(record, "downstream2Width")?,
        downstream2_level: optional_f64(record, "downstream2Level")?,
    })
}

fn read_coefficients(record: &Record) -> Result<FlowCoefficients, StructureError> {
    let d = FlowCoefficients::default();
    Ok(FlowCoefficients {
        pos_free_gate_flow: f64_or(record, "posFreeGateFlowCoeff", d.pos_free_gate_flow)?,
        pos_drowned_gate_flow: f64_or(record, "posDrownGateFlowCoeff", d.pos_drowned_gate_flow)?,
        pos_free_weir_flow: f64_or(record, "posFreeWeirFlowCoeff", d.pos_free_weir_flow)?,
        pos_drowned_weir_flow: f64_or(record, "posDrownWeirFlowCoeff", d.pos_drowned_weir_flow)?,
        pos_contraction_free_gate: f64_or(
            record,
            "posContrCoefFreeGate",
            d.pos_contraction_free_gate,
        )?,
        neg_free_gate_flow: f64_or(record, "negFreeGateFlowCoeff", d.neg_free_gate_flow)?,
        neg_drowned_gate_flow: f64_or(record, "negDrownGateFlowCoeff", d.neg_drowned_gate_flow)?,
        neg_free_weir_flow: f64_or(record, "negFreeWeirFlowCoeff", d.neg_free_weir_flow)?,
        neg_drowned_weir_flow: f64_or(record, "negDrownWeirFlowCoeff", d.neg_drowned_weir_flow)?,
        neg_contraction_free_gate: f64_or(
            record,
            "negContrCoefFreeGate",
            d.neg_contraction_free_gate,
        )?,
    })
}

impl StructureParser for GeneralStructureParser {
    fn parse_kind(
        &self,
        record: &Record,
        header: &StructureHeader,
        ctx: &mut ParseContext<'_>,
    ) -> Result<StructureKind, StructureError> {
        let defaults = GeneralStructure::default();
        let name = header.name.as_str();

        Ok(StructureKind::GeneralStructure(GeneralStructure {
            geometry: read_geometry(record)?,
            crest_level: ctx.steerable(record, name, QUANTITY, "crestLevel", Some(0.0))?,
            crest_width: optional_f64(record, "crestWidth")?,
            crest_length: f64_or(record, "crestLength", defaults.crest_length)?,
            gate_lower_edge_level: ctx.steerable(
                record,
                name,
                QUANTITY,
                "gateLowerEdgeLevel",
                Some(11.0),
            )?,
            gate_height: f64_or(record, "gateHeight", defaults.gate_height)?,
            gate_opening_width: ctx.steerable(
                record,
                name,
                QUANTITY,
                "gateOpeningWidth",
                Some(0.0),
            )?,
            gate_opening_direction: keyword_or(
                record,
                "gateOpeningHorizontalDirection",
                GateOpeningDirection::Symmetric,
            )?,
            coefficients: read_coefficients(record)?,
            extra_resistance: f64_or(record, "extraResistance", defaults.extra_resistance)?,
            use_velocity_height: bool_or(record, "useVelocityHeight", true)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::normalize;
    use crate::structures::parsers::test_support::{parse, record};
    use sluice_core::Steerable;

    #[test]
    fn test_defaults_apply() {
        let r = record(&[("id", "G1"), ("branchId", "B1"), ("chainage", "30")]);
        let s = parse(&GeneralStructureParser, &r).unwrap();
        assert_eq!(
            s.kind,
            StructureKind::GeneralStructure(GeneralStructure::default())
        );
    }

    #[test]
    fn test_legacy_keys_reach_current_fields() {
        let r = record(&[
            ("id", "G1"),
            ("branchId", "B1"),
            ("chainage", "30"),
            ("widthleftW1", "12"),
            ("levelrightZb2", "-1.5"),
            ("levelcenter", "0.4"),
            ("door_opening_width", "2"),
            ("gateOpeningHorizontalDirection", "fromLeft"),
            ("negFreeWeirFlowCoeff", "0.8"),
        ]);
        let r = normalize(vec![r]).records.remove(0);

        let StructureKind::GeneralStructure(gs) = parse(&GeneralStructureParser, &r).unwrap().kind
        else {
            panic!("expected a general structure");
        };
        assert_eq!(gs.geometry.upstream1_width, Some(12.0));
        assert_eq!(gs.geometry.downstream2_level, Some(-1.5));
        assert_eq!(gs.geometry.upstream2_width, None);
        assert_eq!(gs.crest_level, Steerable::Constant(0.4));
        assert_eq!(gs.gate_opening_width, Steerable::Constant(2.0));
        assert_eq!(gs.gate_opening_direction, GateOpeningDirection::FromLeft);
        assert_eq!(gs.coefficients.neg_free_weir_flow, 0.8);
        assert_eq!(gs.coefficients.pos_free_weir_flow, 1.0);
    }
}
