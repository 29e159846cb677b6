//! Cross-section definitions.
//!
//! Culverts and bridges refer to a cross-section definition by id. The
//! definitions are loaded before structures and handed to the structure
//! reader as a [`CrossSectionCatalogue`].

use std::collections::HashMap;

use crate::structures::{CulvertDimensions, CulvertGeometryKind};

#[derive(Debug, Clone, PartialEq)]
pub enum CrossSectionShape {
    Rectangle { width: f64, height: f64, closed: bool },
    Circle { diameter: f64 },
    Egg { width: f64 },
    InvertedEgg { width: f64 },
    Arch { width: f64, height: f64, arc_height: f64 },
    Cunette { width: f64, height: f64 },
    SteelCunette { height: f64, radius: f64 },
    Elliptical { width: f64, height: f64 },
    UShape { width: f64, height: f64 },
    /// Levels with their flow widths
    Tabulated { levels: Vec<f64>, widths: Vec<f64> },
    /// Free-form profile as (y, z) points
    YZ { points: Vec<(f64, f64)> },
}

impl CrossSectionShape {
    /// Closed profile kind used when a culvert is built on this shape.
    pub fn culvert_geometry_kind(&self) -> CulvertGeometryKind {
        match self {
            CrossSectionShape::Rectangle { .. } => CulvertGeometryKind::Rectangle,
            CrossSectionShape::Circle { .. } => CulvertGeometryKind::Round,
            CrossSectionShape::Egg { .. } => CulvertGeometryKind::Egg,
            CrossSectionShape::InvertedEgg { .. } => CulvertGeometryKind::InvertedEgg,
            CrossSectionShape::Arch { .. } => CulvertGeometryKind::Arch,
            CrossSectionShape::Cunette { .. } => CulvertGeometryKind::Cunette,
            CrossSectionShape::SteelCunette { .. } => CulvertGeometryKind::SteelCunette,
            CrossSectionShape::Elliptical { .. } => CulvertGeometryKind::Ellipse,
            CrossSectionShape::UShape { .. } => CulvertGeometryKind::UShape,
            CrossSectionShape::Tabulated { .. } | CrossSectionShape::YZ { .. } => {
                CulvertGeometryKind::Tabulated
            }
        }
    }

    /// Culvert dimensions for this profile; free-form profiles keep the defaults.
    pub fn culvert_dimensions(&self) -> CulvertDimensions {
        let base = CulvertDimensions::default();
        match *self {
            CrossSectionShape::Rectangle {
                width,
                height,
                closed,
            } => CulvertDimensions {
                width,
                height,
                closed,
                ..base
            },
            CrossSectionShape::Circle { diameter } => CulvertDimensions {
                diameter: Some(diameter),
                ..base
            },
            // Egg profiles are one and a half times as high as they are wide.
            CrossSectionShape::Egg { width } | CrossSectionShape::InvertedEgg { width } => {
                CulvertDimensions {
                    width,
                    height: 1.5 * width,
                    ..base
                }
            }
            CrossSectionShape::Arch {
                width,
                height,
                arc_height,
            } => CulvertDimensions {
                width,
                height,
                arc_height: Some(arc_height),
                ..base
            },
            // Semicircular bottom.
            CrossSectionShape::UShape { width, height } => CulvertDimensions {
                width,
                height,
                arc_height: Some(width / 2.0),
                ..base
            },
            CrossSectionShape::Cunette { width, height }
            | CrossSectionShape::Elliptical { width, height } => CulvertDimensions {
                width,
                height,
                ..base
            },
            CrossSectionShape::SteelCunette { height, radius } => CulvertDimensions {
                height,
                radius: Some(radius),
                ..base
            },
            CrossSectionShape::Tabulated { .. } | CrossSectionShape::YZ { .. } => base,
        }
    }

    /// Width and height of a bridge opening with this profile.
    pub fn opening(&self) -> Option<(f64, f64)> {
        match *self {
            CrossSectionShape::Rectangle { width, height, .. }
            | CrossSectionShape::Arch { width, height, .. }
            | CrossSectionShape::Cunette { width, height }
            | CrossSectionShape::Elliptical { width, height }
            | CrossSectionShape::UShape { width, height } => Some((width, height)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionDefinition {
    pub id: String,
    pub shape: CrossSectionShape,
}

impl CrossSectionDefinition {
    pub fn new(id: impl Into<String>, shape: CrossSectionShape) -> Self {
        Self {
            id: id.into(),
            shape,
        }
    }
}

/// Already-loaded cross-section definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct CrossSectionCatalogue {
    definitions: HashMap<String, CrossSectionDefinition>,
}

impl CrossSectionCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any previous one with the same id.
    pub fn insert(&mut self, definition: CrossSectionDefinition) {
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&CrossSectionDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<CrossSectionDefinition> for CrossSectionCatalogue {
    fn from_iter<I: IntoIterator<Item = CrossSectionDefinition>>(iter: I) -> Self {
        let mut catalogue = Self::new();
        for definition in iter {
            catalogue.insert(definition);
        }
        catalogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup() {
        let catalogue: CrossSectionCatalogue = vec![
            CrossSectionDefinition::new("round_1m", CrossSectionShape::Circle { diameter: 1.0 }),
            CrossSectionDefinition::new(
                "box",
                CrossSectionShape::Rectangle {
                    width: 2.0,
                    height: 1.5,
                    closed: true,
                },
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalogue.len(), 2);
        assert!(catalogue.contains("box"));
        assert!(!catalogue.contains("Box"));
        assert_eq!(
            catalogue.get("round_1m").map(|d| d.shape.culvert_geometry_kind()),
            Some(CulvertGeometryKind::Round)
        );
    }

    #[test]
    fn test_culvert_dimensions_follow_the_profile() {
        let rectangle = CrossSectionShape::Rectangle {
            width: 2.0,
            height: 1.5,
            closed: false,
        };
        let dims = rectangle.culvert_dimensions();
        assert_eq!((dims.width, dims.height, dims.closed), (2.0, 1.5, false));

        let round = CrossSectionShape::Circle { diameter: 0.8 }.culvert_dimensions();
        assert_eq!(round.diameter, Some(0.8));

        let arch = CrossSectionShape::Arch {
            width: 3.0,
            height: 2.0,
            arc_height: 0.5,
        }
        .culvert_dimensions();
        assert_eq!((arch.width, arch.height, arch.arc_height), (3.0, 2.0, Some(0.5)));

        let egg = CrossSectionShape::Egg { width: 1.0 }.culvert_dimensions();
        assert_eq!((egg.width, egg.height), (1.0, 1.5));

        let steel = CrossSectionShape::SteelCunette {
            height: 1.2,
            radius: 0.7,
        }
        .culvert_dimensions();
        assert_eq!((steel.height, steel.radius), (1.2, Some(0.7)));

        let tabulated = CrossSectionShape::Tabulated {
            levels: vec![0.0, 1.0],
            widths: vec![1.0, 2.0],
        };
        assert_eq!(tabulated.culvert_dimensions(), CulvertDimensions::default());
        assert_eq!(tabulated.opening(), None);
        assert_eq!(rectangle.opening(), Some((2.0, 1.5)));
    }

    #[test]
    fn test_free_form_shapes_are_tabulated() {
        let yz = CrossSectionShape::YZ {
            points: vec![(0.0, 1.0), (1.0, 0.0), (2.0, 1.0)],
        };
        assert_eq!(yz.culvert_geometry_kind(), CulvertGeometryKind::Tabulated);
    }
}
