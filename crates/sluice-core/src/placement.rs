//! Placement of structures into compound structures.
//!
//! On ordinary branches every structure lives inside a [`CompoundStructure`].
//! A [`PlacementPolicy`] decides which compound receives a structure, or
//! creates a new one.

use petgraph::graph::EdgeIndex;

use crate::error::{SluiceError, SluiceResult};
use crate::graph_utils::{point_at_chainage, snap_chainage};
use crate::structures::{CompoundStructure, Structure};
use crate::Network;

/// Outcome of placing one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Added to an existing compound with this name
    Joined(String),
    /// A new compound with this name was created for the structure
    Created(String),
}

impl Placement {
    pub fn compound_name(&self) -> &str {
        match self {
            Placement::Joined(name) | Placement::Created(name) => name,
        }
    }
}

pub trait PlacementPolicy {
    /// Place `structure` on the branch at `branch`.
    fn place(
        &self,
        network: &mut Network,
        branch: EdgeIndex,
        structure: Structure,
    ) -> SluiceResult<Placement>;
}

/// Create-or-extend placement:
///
/// 1. a compound that declares the structure as a member (case-insensitive),
/// 2. otherwise a compound within `tolerance` of the structure's chainage,
/// 3. otherwise a new compound named `{prefix}{n}` at the snapped chainage.
///
/// The structure takes over the chainage and geometry of its compound.
#[derive(Debug, Clone)]
pub struct CompoundPlacement {
    pub tolerance: f64,
    pub name_prefix: String,
}

impl Default for CompoundPlacement {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            name_prefix: "CompositeBranchStructure".to_string(),
        }
    }
}

impl CompoundPlacement {
    pub fn new(tolerance: f64, name_prefix: impl Into<String>) -> Self {
        Self {
            tolerance,
            name_prefix: name_prefix.into(),
        }
    }
}

impl PlacementPolicy for CompoundPlacement {
    fn place(
        &self,
        network: &mut Network,
        branch: EdgeIndex,
        mut structure: Structure,
    ) -> SluiceResult<Placement> {
        let new_name = network.unique_compound_name(&self.name_prefix);
        let target = network.branch_mut(branch).ok_or_else(|| {
            SluiceError::Network(format!(
                "branch {} for structure '{}' is not part of the network",
                branch.index(),
                structure.name
            ))
        })?;

        let existing = target
            .compounds
            .iter()
            .position(|c| c.declares_member(&structure.name))
            .or_else(|| {
                target
                    .compounds
                    .iter()
                    .position(|c| (c.chainage - structure.chainage).abs() < self.tolerance)
            });

        let (index, placement) = match existing {
            Some(index) => (index, Placement::Joined(target.compounds[index].name.clone())),
            None => {
                let chainage = snap_chainage(target, structure.chainage);
                let geometry = point_at_chainage(target, chainage);
                target
                    .compounds
                    .push(CompoundStructure::new(new_name.clone(), chainage).with_geometry(geometry));
                (target.compounds.len() - 1, Placement::Created(new_name))
            }
        };

        let branch_name = target.name.clone();
        let compound = &mut target.compounds[index];
        structure.branch = branch_name;
        structure.chainage = compound.chainage;
        structure.geometry = compound.geometry;
        compound.structures.push(structure);

        Ok(placement)
    }
}
