//! Attaches parsed structures to a network.
//!
//! Compound definitions are placed first, so that ordinary structures can
//! join the compound that declares them. Ordinary structures are grouped per
//! branch: internal connections take them directly, other branches hand them
//! to a [`PlacementPolicy`].

use std::collections::HashMap;

use serde::Serialize;
use sluice_core::{
    point_at_chainage, snap_chainage, CompoundPlacement, CompoundStructure, EdgeIndex, Network,
    Placement, PlacementPolicy, SluiceError, SluiceResult, Structure, StructureKind,
};
use tracing::debug;

/// Counts of what `attach` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachSummary {
    /// Compound definitions added as branch features
    pub compounds: usize,
    /// Structures attached directly to internal connections
    pub direct: usize,
    /// Structures that joined an existing compound
    pub joined: usize,
    /// Structures for which a new compound was created
    pub created: usize,
}

/// Attach with the default create-or-extend compound placement.
pub fn attach(structures: Vec<Structure>, network: &mut Network) -> SluiceResult<AttachSummary> {
    attach_with(structures, network, &CompoundPlacement::default())
}

pub fn attach_with(
    structures: Vec<Structure>,
    network: &mut Network,
    policy: &dyn PlacementPolicy,
) -> SluiceResult<AttachSummary> {
    let mut summary = AttachSummary::default();
    let (composites, ordinary): (Vec<_>, Vec<_>) =
        structures.into_iter().partition(Structure::is_composite);

    for composite in composites {
        let index = branch_index(network, &composite)?;
        let branch = network
            .branch_mut(index)
            .ok_or_else(|| SluiceError::Network(format!("branch '{}' vanished", composite.branch)))?;

        let chainage = snap_chainage(branch, composite.chainage);
        let StructureKind::Composite(definition) = composite.kind else {
            continue;
        };
        let mut compound = CompoundStructure::new(composite.name, chainage)
            .with_geometry(point_at_chainage(branch, chainage));
        compound.long_name = composite.long_name;
        compound.member_ids = definition.member_ids;

        debug!(branch = %branch.name, "Adding compound '{}' at {}", compound.name, chainage);
        branch.compounds.push(compound);
        summary.compounds += 1;
    }

    for (branch_name, group) in group_by_branch(ordinary) {
        let index = network
            .branch_index(&branch_name)
            .ok_or_else(|| unknown_branch(&branch_name))?;

        let internal = network
            .branch(index)
            .map_or(false, |b| b.is_internal_connection());

        for mut structure in group {
            if internal {
                let branch = network
                    .branch_mut(index)
                    .ok_or_else(|| unknown_branch(&branch_name))?;
                structure.chainage = snap_chainage(branch, structure.chainage);
                structure.geometry = point_at_chainage(branch, structure.chainage);
                branch.structures.push(structure);
                summary.direct += 1;
                continue;
            }

            match policy.place(network, index, structure)? {
                Placement::Joined(_) => summary.joined += 1,
                Placement::Created(_) => summary.created += 1,
            }
        }
    }

    Ok(summary)
}

/// Group by branch name, keeping the first-seen order of branches and structures.
fn group_by_branch(structures: Vec<Structure>) -> Vec<(String, Vec<Structure>)> {
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Structure>)> = Vec::new();
    for structure in structures {
        let slot = *order.entry(structure.branch.clone()).or_insert_with(|| {
            groups.push((structure.branch.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(structure);
    }
    groups
}

fn branch_index(network: &Network, structure: &Structure) -> SluiceResult<EdgeIndex> {
    network
        .branch_index(&structure.branch)
        .ok_or_else(|| unknown_branch(&structure.branch))
}

fn unknown_branch(name: &str) -> SluiceError {
    SluiceError::Network(format!("branch '{}' is not part of the network", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, Point};
    use sluice_core::{
        Branch, BranchId, BranchKind, CompositeStructure, ConnectionNode, NodeId, Pump, Weir,
    };

    fn network() -> Network {
        let mut network = Network::new();
        let a = network.add_node(ConnectionNode::new(NodeId::new(1), "N1", Point::new(0.0, 0.0)));
        let b = network.add_node(ConnectionNode::new(NodeId::new(2), "N2", Point::new(100.0, 0.0)));
        let c = network.add_node(ConnectionNode::new(NodeId::new(3), "N3", Point::new(100.0, 10.0)));
        network.add_branch(
            a,
            b,
            Branch::new(BranchId::new(1), "B1", line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)]),
        );
        network.add_branch(
            b,
            c,
            Branch::new(
                BranchId::new(2),
                "IC1",
                line_string![(x: 100.0, y: 0.0), (x: 100.0, y: 10.0)],
            )
            .with_kind(BranchKind::InternalConnection),
        );
        network
    }

    fn weir(name: &str, branch: &str, chainage: f64) -> Structure {
        Structure::new(name, branch, chainage, StructureKind::Weir(Weir::default()))
    }

    #[test]
    fn test_composite_members_join_declared_compound() {
        let mut network = network();
        let composite = Structure::new(
            "CMP",
            "B1",
            150.0,
            StructureKind::Composite(CompositeStructure {
                member_ids: vec!["W1".into(), "P1".into()],
            }),
        );
        let structures = vec![
            weir("W1", "B1", 20.0),
            Structure::new("P1", "B1", 30.0, StructureKind::Pump(Pump::default())),
            composite,
        ];

        let summary = attach(structures, &mut network).unwrap();
        assert_eq!(
            summary,
            AttachSummary {
                compounds: 1,
                joined: 2,
                ..AttachSummary::default()
            }
        );

        let b1 = network.branch(network.branch_index("B1").unwrap()).unwrap();
        assert_eq!(b1.compounds.len(), 1);
        let compound = &b1.compounds[0];
        assert_eq!(compound.chainage, 100.0);
        assert_eq!(compound.geometry, Some(Point::new(100.0, 0.0)));
        let names: Vec<&str> = compound.structures.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["W1", "P1"]);
        assert!(compound.structures.iter().all(|s| s.chainage == 100.0));
    }

    #[test]
    fn test_internal_connection_holds_structures_directly() {
        let mut network = network();
        let summary = attach(vec![weir("W9", "IC1", 5.0)], &mut network).unwrap();
        assert_eq!(summary.direct, 1);

        let ic = network.branch(network.branch_index("IC1").unwrap()).unwrap();
        assert!(ic.compounds.is_empty());
        assert_eq!(ic.structures[0].geometry, Some(Point::new(100.0, 5.0)));
    }

    #[test]
    fn test_ordinary_structures_create_or_extend() {
        let mut network = network();
        let summary = attach(
            vec![weir("W1", "B1", 20.0), weir("W2", "B1", 20.0), weir("W3", "B1", 50.0)],
            &mut network,
        )
        .unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.joined, 1);
        assert_eq!(network.stats().num_compounds, 2);
        assert_eq!(network.stats().num_structures, 3);
    }

    #[test]
    fn test_unknown_branch_is_error() {
        let mut network = network();
        let err = attach(vec![weir("W1", "B404", 1.0)], &mut network).unwrap_err();
        assert!(err.to_string().contains("B404"));
    }

    #[test]
    fn test_grouping_keeps_file_order() {
        let groups = group_by_branch(vec![
            weir("A", "B2", 0.0),
            weir("B", "B1", 0.0),
            weir("C", "B2", 0.0),
        ]);
        let order: Vec<(&str, usize)> = groups.iter().map(|(b, s)| (b.as_str(), s.len())).collect();
        assert_eq!(order, vec![("B2", 2), ("B1", 1)]);
    }
}
