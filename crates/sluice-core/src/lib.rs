//! # sluice-core: Hydraulic Network Core
//!
//! Provides the data structures for one-dimensional hydraulic networks and the
//! structures (weirs, pumps, culverts, bridges, orifices, compounds) placed on them.
//!
//! ## Design
//!
//! Networks are modeled as **directed graphs** where:
//! - **Nodes**: connection nodes with a location
//! - **Edges**: branches (open channels, pipes, internal sewer connections)
//!
//! Every branch owns the structures placed on it. Ordinary channels host their
//! structures inside [`CompoundStructure`]s anchored at a chainage; internal
//! connections hold their structures directly.
//!
//! ## Quick Start
//!
//! ```rust
//! use geo::{line_string, Point};
//! use sluice_core::*;
//!
//! let mut network = Network::new();
//! let a = network.add_node(ConnectionNode::new(NodeId::new(1), "N1", Point::new(0.0, 0.0)));
//! let b = network.add_node(ConnectionNode::new(NodeId::new(2), "N2", Point::new(100.0, 0.0)));
//!
//! let geometry = line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)];
//! network.add_branch(a, b, Branch::new(BranchId::new(1), "B1", geometry));
//!
//! assert!(network.branch_lookup().contains_key("B1"));
//! ```
//!
//! ## Modules
//!
//! - [`structures`] - Structure types and their parameters
//! - [`time_function`] - Time-dependent values
//! - [`cross_section`] - Cross-section definitions referenced by culverts and bridges
//! - [`placement`] - Compound structure placement policy
//! - [`graph_utils`] - Chainage snapping and branch geometry helpers
//! - [`diagnostics`] - Import diagnostics reporting
//!
//! ## Integration with sluice-io
//!
//! The sluice-io crate reads structure definition files and attaches the
//! parsed structures to a [`Network`].

use std::collections::HashMap;

use geo::{LineString, Point};
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};

pub mod cross_section;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod placement;
pub mod structures;
pub mod time_function;

pub use cross_section::{CrossSectionCatalogue, CrossSectionDefinition, CrossSectionShape};
pub use diagnostics::{DiagnosticIssue, ImportDiagnostics, ImportStats, Severity};
pub use error::{SluiceError, SluiceResult};
pub use graph_utils::{point_at_chainage, snap_chainage};
pub use petgraph::graph::{EdgeIndex, NodeIndex};
pub use placement::{CompoundPlacement, Placement, PlacementPolicy};
pub use structures::*;
pub use time_function::{Interpolation, TimeFunction};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);

impl NodeId {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> usize {
        self.0
    }
}

impl BranchId {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> usize {
        self.0
    }
}

/// A point where branches meet.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionNode {
    pub id: NodeId,
    pub name: String,
    pub location: Point<f64>,
}

impl ConnectionNode {
    pub fn new(id: NodeId, name: impl Into<String>, location: Point<f64>) -> Self {
        Self {
            id,
            name: name.into(),
            location,
        }
    }
}

/// Kind of branch, which decides how structures are attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    /// Open channel
    #[default]
    Channel,
    /// Closed sewer pipe
    Pipe,
    /// Internal sewer connection (holds structures without compounds)
    InternalConnection,
}

/// A one-dimensional network edge that can host structures at a chainage.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub kind: BranchKind,
    /// Length used for chainages; equals the geometry length unless `custom_length` is set.
    pub length: f64,
    pub custom_length: bool,
    pub geometry: LineString<f64>,
    pub compounds: Vec<CompoundStructure>,
    /// Structures attached without a compound (internal connections only)
    pub structures: Vec<Structure>,
}

impl Branch {
    /// Create a channel whose length is taken from its geometry.
    pub fn new(id: BranchId, name: impl Into<String>, geometry: LineString<f64>) -> Self {
        use geo::EuclideanLength;

        Self {
            id,
            name: name.into(),
            kind: BranchKind::Channel,
            length: geometry.euclidean_length(),
            custom_length: false,
            geometry,
            compounds: Vec::new(),
            structures: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: BranchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Override the chainage length (e.g. measured length differs from the drawn line).
    pub fn with_custom_length(mut self, length: f64) -> Self {
        self.length = length;
        self.custom_length = true;
        self
    }

    pub fn is_internal_connection(&self) -> bool {
        self.kind == BranchKind::InternalConnection
    }

    /// All structures on this branch, whether inside a compound or attached directly.
    pub fn all_structures(&self) -> impl Iterator<Item = &Structure> {
        self.compounds
            .iter()
            .flat_map(|c| c.structures.iter())
            .chain(self.structures.iter())
    }
}

/// Basic counts over a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub num_nodes: usize,
    pub num_branches: usize,
    pub num_compounds: usize,
    pub num_structures: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: DiGraph<ConnectionNode, Branch>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }

    pub fn add_node(&mut self, node: ConnectionNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub fn add_branch(&mut self, from: NodeIndex, to: NodeIndex, branch: Branch) -> EdgeIndex {
        self.graph.add_edge(from, to, branch)
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.graph.edge_weights()
    }

    pub fn branch(&self, index: EdgeIndex) -> Option<&Branch> {
        self.graph.edge_weight(index)
    }

    pub fn branch_mut(&mut self, index: EdgeIndex) -> Option<&mut Branch> {
        self.graph.edge_weight_mut(index)
    }

    /// Find a branch by its (case-sensitive) name.
    pub fn branch_index(&self, name: &str) -> Option<EdgeIndex> {
        self.graph
            .edge_indices()
            .find(|&idx| self.graph[idx].name == name)
    }

    /// Name to branch lookup used when reading structure files.
    pub fn branch_lookup(&self) -> HashMap<String, &Branch> {
        self.branches().map(|b| (b.name.clone(), b)).collect()
    }

    pub fn compounds(&self) -> impl Iterator<Item = &CompoundStructure> {
        self.branches().flat_map(|b| b.compounds.iter())
    }

    /// Every structure in the network, including compound members.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.branches().flat_map(|b| b.all_structures())
    }

    /// Generate a compound name that is not yet used anywhere in the network.
    pub fn unique_compound_name(&self, prefix: &str) -> String {
        let mut n = self.compounds().count() + 1;
        loop {
            let candidate = format!("{}{}", prefix, n);
            if !self.compounds().any(|c| c.name == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_nodes: self.graph.node_count(),
            num_branches: self.graph.edge_count(),
            num_compounds: self.compounds().count(),
            num_structures: self.structures().count(),
        }
    }
}
