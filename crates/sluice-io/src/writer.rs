//! Writes structures back into the structure file format.
//!
//! Time-dependent properties are collected into one companion `.bc` file that
//! the structure file references by name. Compounds are written after all
//! other structures so the file reads back in a valid order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sluice_core::{
    Bridge, CompositeStructure, Culvert, CulvertSubType, GeneralStructure, Keyword, Orifice, Pump,
    Steerable, Structure, StructureKind, UniversalWeir, Weir,
};
use tracing::info;

use crate::timeseries::bc::write_bc_block;

/// Rendered file contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub ini: String,
    /// Companion forcing file, `None` when no property is time dependent
    pub bc: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StructureWriter {
    reference_time: NaiveDateTime,
    bc_file_name: String,
}

/// Output buffers for one file pair.
struct Output<'a> {
    writer: &'a StructureWriter,
    ini: String,
    bc: String,
}

impl Output<'_> {
    fn property(&mut self, key: &str, value: impl std::fmt::Display) {
        self.ini.push_str(&format!("{:<32}= {}\n", key, value));
    }

    fn optional(&mut self, key: &str, value: Option<f64>) {
        if let Some(value) = value {
            self.property(key, value);
        }
    }

    fn list(&mut self, key: &str, values: impl IntoIterator<Item = f64>) {
        let joined = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.property(key, joined);
    }

    fn table(&mut self, count_key: &str, first: &str, second: &str, rows: &[(f64, f64)]) {
        if rows.is_empty() {
            return;
        }
        self.property(count_key, rows.len());
        self.list(first, rows.iter().map(|(a, _)| *a));
        self.list(second, rows.iter().map(|(_, b)| *b));
    }

    /// Constant values inline; series go to the forcing file under `{prefix}_{key}`.
    fn steerable(&mut self, structure: &str, prefix: &str, key: &str, value: &Steerable) {
        match value {
            Steerable::Constant(v) => self.property(key, v),
            Steerable::TimeSeries(function) => {
                let file_name = self.writer.bc_file_name.clone();
                self.property(key, file_name);
                self.bc.push_str(&write_bc_block(
                    structure,
                    &format!("{}_{}", prefix, key),
                    unit_for(key),
                    function,
                    self.writer.reference_time,
                ));
            }
        }
    }
}

fn unit_for(key: &str) -> &'static str {
    match key {
        "capacity" => "m3/s",
        _ => "m",
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

impl StructureWriter {
    pub fn new(reference_time: NaiveDateTime) -> Self {
        Self {
            reference_time,
            bc_file_name: "structures.bc".to_string(),
        }
    }

    /// Name of the companion forcing file, relative to the structure file.
    pub fn with_bc_file_name(mut self, name: impl Into<String>) -> Self {
        self.bc_file_name = name.into();
        self
    }

    pub fn bc_file_name(&self) -> &str {
        &self.bc_file_name
    }

    pub fn render(&self, structures: &[Structure]) -> Rendered {
        let mut out = Output {
            writer: self,
            ini: String::new(),
            bc: String::new(),
        };

        out.ini.push_str("[General]\n");
        out.property("fileVersion", "3.00");
        out.property("fileType", "structure");

        let (composites, ordinary): (Vec<&Structure>, Vec<&Structure>) =
            structures.iter().partition(|s| s.is_composite());
        for structure in ordinary.into_iter().chain(composites) {
            write_structure(structure, &mut out);
        }

        let bc = if out.bc.is_empty() {
            None
        } else {
            let mut bc = String::from("[General]\nfileVersion = 1.01\nfileType = boundConds\n\n");
            bc.push_str(&out.bc);
            Some(bc)
        };
        Rendered { ini: out.ini, bc }
    }

    /// Write the structure file at `path` and, if needed, the forcing file next to it.
    pub fn write(&self, structures: &[Structure], path: &Path) -> Result<()> {
        let rendered = self.render(structures);
        fs::write(path, &rendered.ini)
            .with_context(|| format!("writing structure file {}", path.display()))?;

        if let Some(bc) = rendered.bc {
            let bc_path = path.with_file_name(&self.bc_file_name);
            fs::write(&bc_path, bc)
                .with_context(|| format!("writing forcing file {}", bc_path.display()))?;
        }

        info!(
            "Wrote {} structure(s) to {}",
            structures.len(),
            path.display()
        );
        Ok(())
    }
}

fn write_structure(structure: &Structure, out: &mut Output<'_>) {
    out.ini.push_str("\n[Structure]\n");
    out.property("id", &structure.name);
    if !structure.long_name.is_empty() {
        out.property("name", &structure.long_name);
    }
    out.property("type", structure.structure_type().as_str());
    out.property("branchId", &structure.branch);
    out.property("chainage", structure.chainage);
    out.property("allowedFlowDir", structure.flow_direction.as_str());

    let name = structure.name.as_str();
    match &structure.kind {
        StructureKind::Weir(weir) => write_weir(name, weir, out),
        StructureKind::UniversalWeir(weir) => write_universal_weir(weir, out),
        StructureKind::GeneralStructure(general) => write_general_structure(name, general, out),
        StructureKind::Orifice(orifice) => write_orifice(name, orifice, out),
        StructureKind::Pump(pump) => write_pump(name, pump, out),
        StructureKind::Bridge(bridge) => write_bridge(bridge, out),
        StructureKind::Culvert(culvert) => write_culvert(name, culvert, out),
        StructureKind::Composite(composite) => write_composite(composite, out),
    }
}

fn write_weir(name: &str, weir: &Weir, out: &mut Output<'_>) {
    out.steerable(name, "weir", "crestLevel", &weir.crest_level);
    out.optional("crestWidth", weir.crest_width);
    out.property("corrCoeff", weir.correction_coefficient);
    out.property("useVelocityHeight", weir.use_velocity_height);
}

fn write_universal_weir(weir: &UniversalWeir, out: &mut Output<'_>) {
    out.property("crestLevel", weir.crest_level);
    out.property("numLevels", weir.y_values.len());
    out.list("yValues", weir.y_values.iter().copied());
    out.list("zValues", weir.z_values.iter().copied());
    out.property("dischargeCoeff", weir.discharge_coefficient);
    out.property("useVelocityHeight", weir.use_velocity_height);
}

fn write_general_structure(name: &str, general: &GeneralStructure, out: &mut Output<'_>) {
    const PREFIX: &str = "generalStructure";

    let g = &general.geometry;
    out.optional("upstream1Width", g.upstream1_width);
    out.optional("upstream1Level", g.upstream1_level);
    out.optional("upstream2Width", g.upstream2_width);
    out.optional("upstream2Level", g.upstream2_level);
    out.optional("downstream1Width", g.downstream1_width);
    out.optional("downstream1Level", g.downstream1_level);
    out.optional("downstream2Width", g.downstream2_width);
    out.optional("downstream2Level", g.downstream2_level);

    out.steerable(name, PREFIX, "crestLevel", &general.crest_level);
    out.optional("crestWidth", general.crest_width);
    out.property("crestLength", general.crest_length);
    out.steerable(name, PREFIX, "gateLowerEdgeLevel", &general.gate_lower_edge_level);
    out.property("gateHeight", general.gate_height);
    out.steerable(name, PREFIX, "gateOpeningWidth", &general.gate_opening_width);
    out.property(
        "gateOpeningHorizontalDirection",
        general.gate_opening_direction.as_str(),
    );

    let c = &general.coefficients;
    out.property("posFreeGateFlowCoeff", c.pos_free_gate_flow);
    out.property("posDrownGateFlowCoeff", c.pos_drowned_gate_flow);
    out.property("posFreeWeirFlowCoeff", c.pos_free_weir_flow);
    out.property("posDrownWeirFlowCoeff", c.pos_drowned_weir_flow);
    out.property("posContrCoefFreeGate", c.pos_contraction_free_gate);
    out.property("negFreeGateFlowCoeff", c.neg_free_gate_flow);
    out.property("negDrownGateFlowCoeff", c.neg_drowned_gate_flow);
    out.property("negFreeWeirFlowCoeff", c.neg_free_weir_flow);
    out.property("negDrownWeirFlowCoeff", c.neg_drowned_weir_flow);
    out.property("negContrCoefFreeGate", c.neg_contraction_free_gate);

    out.property("extraResistance", general.extra_resistance);
    out.property("useVelocityHeight", general.use_velocity_height);
}

fn write_orifice(name: &str, orifice: &Orifice, out: &mut Output<'_>) {
    out.steerable(name, "orifice", "crestLevel", &orifice.crest_level);
    out.optional("crestWidth", orifice.crest_width);
    out.steerable(
        name,
        "orifice",
        "gateLowerEdgeLevel",
        &orifice.gate_lower_edge_level,
    );
    out.property("corrCoeff", orifice.correction_coefficient);
    out.property("useLimitFlowPos", flag(orifice.limit_flow_pos.is_some()));
    out.optional("limitFlowPos", orifice.limit_flow_pos);
    out.property("useLimitFlowNeg", flag(orifice.limit_flow_neg.is_some()));
    out.optional("limitFlowNeg", orifice.limit_flow_neg);
    out.property("useVelocityHeight", orifice.use_velocity_height);
}

fn write_pump(name: &str, pump: &Pump, out: &mut Output<'_>) {
    out.property("orientation", pump.orientation.as_str());
    out.property("controlSide", pump.control_side.as_str());
    out.property("numStages", pump.num_stages);
    out.steerable(name, "pump", "capacity", &pump.capacity);
    out.property("startLevelSuctionSide", pump.start_level_suction_side);
    out.property("stopLevelSuctionSide", pump.stop_level_suction_side);
    out.property("startLevelDeliverySide", pump.start_level_delivery_side);
    out.property("stopLevelDeliverySide", pump.stop_level_delivery_side);
    out.table(
        "numReductionLevels",
        "head",
        "reductionFactor",
        &pump.reduction_table,
    );
}

fn write_bridge(bridge: &Bridge, out: &mut Output<'_>) {
    if let Some(id) = &bridge.cross_section {
        out.property("csDefId", id);
    }
    out.property("shift", bridge.shift);
    out.property("length", bridge.length);
    out.property("inletLossCoeff", bridge.inlet_loss_coefficient);
    out.property("outletLossCoeff", bridge.outlet_loss_coefficient);
    if let Some(pillar) = &bridge.pillar {
        out.property("pillarWidth", pillar.width);
        out.property("formFactor", pillar.form_factor);
    }
    out.property("frictionType", bridge.friction_type.as_str());
    out.property("friction", bridge.friction);
}

fn write_culvert(name: &str, culvert: &Culvert, out: &mut Output<'_>) {
    if culvert.sub_type == CulvertSubType::Culvert {
        out.property("subType", culvert.sub_type.as_str());
    }
    if let Some(id) = &culvert.cross_section {
        out.property("csDefId", id);
    }
    out.property("leftLevel", culvert.left_level);
    out.property("rightLevel", culvert.right_level);
    out.property("length", culvert.length);
    out.property("inletLossCoeff", culvert.inlet_loss_coefficient);
    out.property("outletLossCoeff", culvert.outlet_loss_coefficient);

    out.property("valveOnOff", flag(culvert.valve.is_some()));
    if let Some(valve) = &culvert.valve {
        out.steerable(name, "culvert", "valveOpeningHeight", &valve.opening_height);
        out.table("numLossCoeff", "relOpening", "lossCoeff", &valve.loss_table);
    }

    out.property("bedFrictionType", culvert.friction_type.as_str());
    out.property("bedFriction", culvert.friction);
    out.optional("bendLossCoeff", culvert.bend_loss_coefficient);
}

fn write_composite(composite: &CompositeStructure, out: &mut Output<'_>) {
    out.property("numStructures", composite.member_ids.len());
    out.property("structureIds", composite.member_ids.join(";"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use sluice_core::TimeFunction;

    fn reference_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_constant_weir_has_no_forcing_file() {
        let weir = Structure::new(
            "W1",
            "B1",
            12.5,
            StructureKind::Weir(Weir {
                crest_level: Steerable::Constant(1.25),
                ..Weir::default()
            }),
        );
        let rendered = StructureWriter::new(reference_time()).render(&[weir]);

        assert!(rendered.bc.is_none());
        assert!(rendered.ini.starts_with("[General]\n"));
        assert!(rendered.ini.contains("type                            = weir\n"));
        assert!(rendered.ini.contains("crestLevel                      = 1.25\n"));
        assert!(!rendered.ini.contains("crestWidth"));
    }

    #[test]
    fn test_time_series_goes_to_forcing_file() {
        let t0 = reference_time();
        let capacity = TimeFunction::new(vec![(t0, 1.0), (t0 + Duration::hours(1), 2.0)]);
        let pump = Structure::new(
            "P1",
            "B1",
            5.0,
            StructureKind::Pump(Pump {
                capacity: Steerable::TimeSeries(capacity),
                ..Pump::default()
            }),
        );

        let rendered = StructureWriter::new(t0)
            .with_bc_file_name("pumps.bc")
            .render(&[pump]);
        assert!(rendered.ini.contains("capacity                        = pumps.bc\n"));

        let bc = rendered.bc.unwrap();
        assert!(bc.contains("name              = P1\n"));
        assert!(bc.contains("quantity          = pump_capacity\n"));
        assert!(bc.contains("3600 2\n"));
    }

    #[test]
    fn test_compounds_written_last() {
        let compound = Structure::new(
            "CMP",
            "B1",
            1.0,
            StructureKind::Composite(CompositeStructure {
                member_ids: vec!["W1".into(), "W2".into()],
            }),
        );
        let weir = |name: &str| Structure::new(name, "B1", 1.0, StructureKind::Weir(Weir::default()));

        let rendered = StructureWriter::new(reference_time()).render(&[
            weir("W1"),
            compound,
            weir("W2"),
        ]);
        let ids: Vec<&str> = rendered
            .ini
            .lines()
            .filter_map(|l| l.strip_prefix("id"))
            .map(|l| l.trim_start_matches([' ', '=']).trim())
            .collect();
        assert_eq!(ids, vec!["W1", "W2", "CMP"]);
        assert!(rendered.ini.contains("structureIds                    = W1;W2\n"));
    }
}
