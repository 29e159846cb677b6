//! Hydraulic structure model.
//!
//! A [`Structure`] carries the fields every structure has (name, branch,
//! chainage, geometry, allowed flow direction) plus a [`StructureKind`] with
//! the type-specific parameters. Parameters that may vary in time are
//! [`Steerable`]s.

use std::fmt;
use std::str::FromStr;

use geo::Point;
use thiserror::Error;

use crate::time_function::TimeFunction;

/// Raised when a keyword does not match any variant of a keyword enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not one of {expected}")]
pub struct UnknownKeyword {
    pub value: String,
    pub expected: String,
}

/// Enum whose variants are written as keywords in structure files.
pub trait Keyword: Sized + Copy + 'static {
    const VARIANTS: &'static [(Self, &'static str)];

    fn as_str(&self) -> &'static str;

    /// Comma separated list of accepted keywords, for error messages
    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|(_, k)| format!("'{}'", k))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive lookup.
    fn from_keyword(value: &str) -> Result<Self, UnknownKeyword> {
        let trimmed = value.trim();
        Self::VARIANTS
            .iter()
            .find(|(_, k)| k.eq_ignore_ascii_case(trimmed))
            .map(|(v, _)| *v)
            .ok_or_else(|| UnknownKeyword {
                value: trimmed.to_string(),
                expected: Self::expected(),
            })
    }
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $keyword:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl Keyword for $name {
            const VARIANTS: &'static [(Self, &'static str)] = &[$(($name::$variant, $keyword)),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $keyword),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Keyword>::from_keyword(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum! {
    /// Every structure type tag that can appear in a structure file.
    ///
    /// Not every type has a parser; see `sluice_io::structures::parser_for`.
    pub enum StructureType {
        Weir => "weir",
        UniversalWeir => "universalWeir",
        RiverWeir => "riverWeir",
        AdvancedWeir => "advancedWeir",
        GeneralStructure => "generalStructure",
        Orifice => "orifice",
        Gate => "gate",
        Pump => "pump",
        Bridge => "bridge",
        BridgePillar => "bridgePillar",
        Culvert => "culvert",
        InvertedSiphon => "invertedSiphon",
        ExtraResistance => "extraResistance",
        Dambreak => "dambreak",
        CompositeBranchStructure => "compound",
    }
}

keyword_enum! {
    pub enum FlowDirection {
        Both => "both",
        Positive => "positive",
        Negative => "negative",
        None => "none",
    }
}

keyword_enum! {
    pub enum FrictionType {
        Chezy => "Chezy",
        Manning => "Manning",
        StricklerKs => "StricklerKs",
        WhiteColebrook => "WhiteColebrook",
    }
}

keyword_enum! {
    pub enum PumpOrientation {
        Positive => "positive",
        Negative => "negative",
    }
}

keyword_enum! {
    pub enum PumpControlSide {
        SuctionSide => "suctionSide",
        DeliverySide => "deliverySide",
        Both => "both",
    }
}

keyword_enum! {
    pub enum GateOpeningDirection {
        Symmetric => "symmetric",
        FromLeft => "fromLeft",
        FromRight => "fromRight",
    }
}

keyword_enum! {
    pub enum CulvertSubType {
        Culvert => "culvert",
        InvertedSiphon => "invertedSiphon",
    }
}

keyword_enum! {
    /// Closed profile of a culvert, derived from its cross-section definition.
    pub enum CulvertGeometryKind {
        Rectangle => "rectangle",
        Round => "round",
        Egg => "egg",
        InvertedEgg => "invertedEgg",
        Arch => "arch",
        Cunette => "cunette",
        SteelCunette => "steelCunette",
        Ellipse => "ellipse",
        UShape => "uShape",
        Tabulated => "tabulated",
    }
}

impl Default for FlowDirection {
    fn default() -> Self {
        FlowDirection::Both
    }
}

impl Default for FrictionType {
    fn default() -> Self {
        FrictionType::Chezy
    }
}

/// A parameter that is either a constant or follows a time series.
#[derive(Debug, Clone, PartialEq)]
pub enum Steerable {
    Constant(f64),
    TimeSeries(TimeFunction),
}

impl Steerable {
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Steerable::Constant(v) => Some(*v),
            Steerable::TimeSeries(_) => None,
        }
    }

    pub fn time_series(&self) -> Option<&TimeFunction> {
        match self {
            Steerable::TimeSeries(f) => Some(f),
            Steerable::Constant(_) => None,
        }
    }

    pub fn is_time_dependent(&self) -> bool {
        matches!(self, Steerable::TimeSeries(_))
    }
}

impl Default for Steerable {
    fn default() -> Self {
        Steerable::Constant(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weir {
    pub crest_level: Steerable,
    pub crest_width: Option<f64>,
    pub correction_coefficient: f64,
    pub use_velocity_height: bool,
}

impl Default for Weir {
    fn default() -> Self {
        Self {
            crest_level: Steerable::default(),
            crest_width: None,
            correction_coefficient: 1.0,
            use_velocity_height: true,
        }
    }
}

/// Weir with a free-form crest described by y/z pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct UniversalWeir {
    pub crest_level: f64,
    pub y_values: Vec<f64>,
    pub z_values: Vec<f64>,
    pub discharge_coefficient: f64,
    pub use_velocity_height: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Orifice {
    pub crest_level: Steerable,
    pub crest_width: Option<f64>,
    pub gate_lower_edge_level: Steerable,
    pub correction_coefficient: f64,
    pub limit_flow_pos: Option<f64>,
    pub limit_flow_neg: Option<f64>,
    pub use_velocity_height: bool,
}

/// Widths and levels of the approach and departure sections of a general structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralStructureGeometry {
    pub upstream1_width: Option<f64>,
    pub upstream1_level: Option<f64>,
    pub upstream2_width: Option<f64>,
    pub upstream2_level: Option<f64>,
    pub downstream1_width: Option<f64>,
    pub downstream1_level: Option<f64>,
    pub downstream2_width: Option<f64>,
    pub downstream2_level: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowCoefficients {
    pub pos_free_gate_flow: f64,
    pub pos_drowned_gate_flow: f64,
    pub pos_free_weir_flow: f64,
    pub pos_drowned_weir_flow: f64,
    pub pos_contraction_free_gate: f64,
    pub neg_free_gate_flow: f64,
    pub neg_drowned_gate_flow: f64,
    pub neg_free_weir_flow: f64,
    pub neg_drowned_weir_flow: f64,
    pub neg_contraction_free_gate: f64,
}

impl Default for FlowCoefficients {
    fn default() -> Self {
        Self {
            pos_free_gate_flow: 1.0,
            pos_drowned_gate_flow: 1.0,
            pos_free_weir_flow: 1.0,
            pos_drowned_weir_flow: 1.0,
            pos_contraction_free_gate: 1.0,
            neg_free_gate_flow: 1.0,
            neg_drowned_gate_flow: 1.0,
            neg_free_weir_flow: 1.0,
            neg_drowned_weir_flow: 1.0,
            neg_contraction_free_gate: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralStructure {
    pub geometry: GeneralStructureGeometry,
    pub crest_level: Steerable,
    pub crest_width: Option<f64>,
    pub crest_length: f64,
    pub gate_lower_edge_level: Steerable,
    pub gate_height: f64,
    pub gate_opening_width: Steerable,
    pub gate_opening_direction: GateOpeningDirection,
    pub coefficients: FlowCoefficients,
    pub extra_resistance: f64,
    pub use_velocity_height: bool,
}

impl Default for GeneralStructure {
    fn default() -> Self {
        Self {
            geometry: GeneralStructureGeometry::default(),
            crest_level: Steerable::Constant(0.0),
            crest_width: None,
            crest_length: 0.0,
            gate_lower_edge_level: Steerable::Constant(11.0),
            gate_height: 1e10,
            gate_opening_width: Steerable::Constant(0.0),
            gate_opening_direction: GateOpeningDirection::Symmetric,
            coefficients: FlowCoefficients::default(),
            extra_resistance: 0.0,
            use_velocity_height: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    pub orientation: PumpOrientation,
    pub control_side: PumpControlSide,
    pub num_stages: u32,
    pub capacity: Steerable,
    pub start_level_suction_side: f64,
    pub stop_level_suction_side: f64,
    pub start_level_delivery_side: f64,
    pub stop_level_delivery_side: f64,
    /// (head, reduction factor) pairs
    pub reduction_table: Vec<(f64, f64)>,
}

impl Default for Pump {
    fn default() -> Self {
        Self {
            orientation: PumpOrientation::Positive,
            control_side: PumpControlSide::SuctionSide,
            num_stages: 1,
            capacity: Steerable::Constant(0.0),
            start_level_suction_side: 0.0,
            stop_level_suction_side: 0.0,
            start_level_delivery_side: 0.0,
            stop_level_delivery_side: 0.0,
            reduction_table: Vec::new(),
        }
    }
}

/// Pillars standing in the opening of a bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgePillar {
    /// Total width of all pillars
    pub width: f64,
    pub form_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bridge {
    /// Id of the cross-section definition of the bridge opening
    pub cross_section: Option<String>,
    pub width: f64,
    pub height: f64,
    pub shift: f64,
    pub length: f64,
    pub inlet_loss_coefficient: f64,
    pub outlet_loss_coefficient: f64,
    pub pillar: Option<BridgePillar>,
    pub friction_type: FrictionType,
    pub friction: f64,
}

impl Bridge {
    /// Opening used when no cross-section definition is available.
    pub const DEFAULT_WIDTH: f64 = 50.0;
    pub const DEFAULT_HEIGHT: f64 = 3.0;

    pub fn is_pillar(&self) -> bool {
        self.pillar.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CulvertValve {
    pub opening_height: Steerable,
    /// (relative opening, loss coefficient) pairs
    pub loss_table: Vec<(f64, f64)>,
}

/// Profile dimensions of a culvert, taken from its cross-section definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CulvertDimensions {
    pub width: f64,
    pub height: f64,
    pub diameter: Option<f64>,
    pub arc_height: Option<f64>,
    /// Steel cunette radius
    pub radius: Option<f64>,
    pub closed: bool,
}

impl Default for CulvertDimensions {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            diameter: None,
            arc_height: None,
            radius: None,
            closed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Culvert {
    pub sub_type: CulvertSubType,
    pub cross_section: Option<String>,
    /// `Tabulated` when there is no usable cross-section definition
    pub geometry_kind: CulvertGeometryKind,
    pub dimensions: CulvertDimensions,
    pub left_level: f64,
    pub right_level: f64,
    pub length: f64,
    pub inlet_loss_coefficient: f64,
    pub outlet_loss_coefficient: f64,
    pub valve: Option<CulvertValve>,
    pub friction_type: FrictionType,
    pub friction: f64,
    /// Only set for inverted siphons
    pub bend_loss_coefficient: Option<f64>,
}

/// A compound definition read from file: names the structures it groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeStructure {
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructureKind {
    Weir(Weir),
    UniversalWeir(UniversalWeir),
    GeneralStructure(GeneralStructure),
    Orifice(Orifice),
    Pump(Pump),
    Bridge(Bridge),
    Culvert(Culvert),
    Composite(CompositeStructure),
}

/// A parsed structure placed on a branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    /// Unique (case-sensitive) name
    pub name: String,
    pub long_name: String,
    /// Name of the owning branch
    pub branch: String,
    pub chainage: f64,
    pub geometry: Option<Point<f64>>,
    pub flow_direction: FlowDirection,
    pub kind: StructureKind,
}

impl Structure {
    pub fn new(
        name: impl Into<String>,
        branch: impl Into<String>,
        chainage: f64,
        kind: StructureKind,
    ) -> Self {
        Self {
            name: name.into(),
            long_name: String::new(),
            branch: branch.into(),
            chainage,
            geometry: None,
            flow_direction: FlowDirection::Both,
            kind,
        }
    }

    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = long_name.into();
        self
    }

    pub fn with_flow_direction(mut self, flow_direction: FlowDirection) -> Self {
        self.flow_direction = flow_direction;
        self
    }

    pub fn structure_type(&self) -> StructureType {
        match &self.kind {
            StructureKind::Weir(_) => StructureType::Weir,
            StructureKind::UniversalWeir(_) => StructureType::UniversalWeir,
            StructureKind::GeneralStructure(_) => StructureType::GeneralStructure,
            StructureKind::Orifice(_) => StructureType::Orifice,
            StructureKind::Pump(_) => StructureType::Pump,
            StructureKind::Bridge(_) => StructureType::Bridge,
            StructureKind::Culvert(c) => match c.sub_type {
                CulvertSubType::Culvert => StructureType::Culvert,
                CulvertSubType::InvertedSiphon => StructureType::InvertedSiphon,
            },
            StructureKind::Composite(_) => StructureType::CompositeBranchStructure,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, StructureKind::Composite(_))
    }
}

/// Groups structures at one location on a branch.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundStructure {
    pub name: String,
    pub long_name: String,
    pub chainage: f64,
    pub geometry: Option<Point<f64>>,
    /// Member names declared in the structure file (empty for generated compounds)
    pub member_ids: Vec<String>,
    pub structures: Vec<Structure>,
}

impl CompoundStructure {
    pub fn new(name: impl Into<String>, chainage: f64) -> Self {
        Self {
            name: name.into(),
            long_name: String::new(),
            chainage,
            geometry: None,
            member_ids: Vec::new(),
            structures: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Option<Point<f64>>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Whether `name` is one of the declared members (case-insensitive).
    pub fn declares_member(&self, name: &str) -> bool {
        self.member_ids.iter().any(|m| m.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_type_tags_are_case_insensitive() {
        assert_eq!("WEIR".parse::<StructureType>(), Ok(StructureType::Weir));
        assert_eq!(
            "generalstructure".parse::<StructureType>(),
            Ok(StructureType::GeneralStructure)
        );
        assert_eq!(
            "Compound".parse::<StructureType>(),
            Ok(StructureType::CompositeBranchStructure)
        );
    }

    #[test]
    fn test_unknown_keyword_lists_expected_values() {
        let err = "sideways".parse::<FlowDirection>().unwrap_err();
        assert_eq!(err.value, "sideways");
        assert_eq!(err.expected, "'both', 'positive', 'negative', 'none'");
    }

    #[test]
    fn test_keyword_display_round_trips() {
        for (variant, keyword) in StructureType::VARIANTS {
            assert_eq!(variant.to_string(), *keyword);
            assert_eq!(keyword.parse::<StructureType>().as_ref(), Ok(variant));
        }
    }

    #[test]
    fn test_structure_type_of_kinds() {
        let culvert = Culvert {
            sub_type: CulvertSubType::InvertedSiphon,
            cross_section: Some("CS1".into()),
            geometry_kind: CulvertGeometryKind::Round,
            dimensions: CulvertDimensions::default(),
            left_level: 0.0,
            right_level: 0.0,
            length: 10.0,
            inlet_loss_coefficient: 0.5,
            outlet_loss_coefficient: 0.5,
            valve: None,
            friction_type: FrictionType::Chezy,
            friction: 45.0,
            bend_loss_coefficient: Some(0.2),
        };
        let s = Structure::new("S1", "B1", 5.0, StructureKind::Culvert(culvert));
        assert_eq!(s.structure_type(), StructureType::InvertedSiphon);
        assert!(!s.is_composite());

        let c = Structure::new(
            "C1",
            "B1",
            5.0,
            StructureKind::Composite(CompositeStructure::default()),
        );
        assert!(c.is_composite());
    }

    #[test]
    fn test_steerable_accessors() {
        let constant = Steerable::Constant(1.5);
        assert_eq!(constant.constant_value(), Some(1.5));
        assert!(!constant.is_time_dependent());

        let series = Steerable::TimeSeries(TimeFunction::empty());
        assert!(series.time_series().is_some());
        assert!(series.is_time_dependent());
    }

    #[test]
    fn test_compound_member_match_ignores_case() {
        let mut compound = CompoundStructure::new("C1", 0.0);
        compound.member_ids = vec!["Weir1".into()];
        assert!(compound.declares_member("WEIR1"));
        assert!(!compound.declares_member("Weir2"));
    }
}
