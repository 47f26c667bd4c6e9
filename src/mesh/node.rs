//! Node and node set - points on the boundary surfaces of a thin section

use std::collections::{BTreeMap, HashSet};

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{LinResult, LinearizationError};

/// Solver node identifier, unique within a mesh
pub type NodeId = u32;

/// A mesh node with its 3D coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Solver node number
    pub id: NodeId,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(id: NodeId, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Get the coordinates as a point
    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// An ordered collection of nodes forming one boundary surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Build a set from nodes, keeping the first occurrence of a repeated id
    pub fn new(nodes: Vec<Node>) -> Self {
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.id) {
                unique.push(node);
            } else {
                log::warn!("duplicate node {} in node set, keeping first occurrence", node.id);
            }
        }
        Self { nodes: unique }
    }

    /// Look up the coordinates of `ids` in a location table
    pub fn from_ids(ids: &[NodeId], locations: &NodeLocations) -> LinResult<Self> {
        let nodes = ids
            .iter()
            .map(|&id| locations.node(id))
            .collect::<LinResult<Vec<_>>>()?;
        Ok(Self::new(nodes))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids in set order
    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Find a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Keep only the nodes whose id is in `keep`, preserving order
    pub fn restrict(&self, keep: &HashSet<NodeId>) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|n| keep.contains(&n.id))
                .copied()
                .collect(),
        }
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Coordinate lookup table for every node of a mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLocations {
    coords: BTreeMap<NodeId, [f64; 3]>,
}

impl NodeLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; an already present id keeps its first coordinates
    pub fn insert(&mut self, node: Node) {
        self.coords.entry(node.id).or_insert(node.coords());
    }

    /// Coordinates of a node
    pub fn get(&self, id: NodeId) -> LinResult<[f64; 3]> {
        self.coords.get(&id).copied().ok_or_else(|| {
            LinearizationError::InvalidInput(format!(
                "node {id} is not present in the coordinate table"
            ))
        })
    }

    /// The node with its coordinates
    pub fn node(&self, id: NodeId) -> LinResult<Node> {
        let [x, y, z] = self.get(id)?;
        Ok(Node::new(id, x, y, z))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.coords.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Nodes in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        self.coords
            .iter()
            .map(|(&id, c)| Node::new(id, c[0], c[1], c[2]))
    }
}

impl FromIterator<Node> for NodeLocations {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut locations = Self::new();
        for node in iter {
            locations.insert(node);
        }
        locations
    }
}

impl<'a> From<&'a NodeSet> for NodeLocations {
    fn from(set: &'a NodeSet) -> Self {
        set.iter().copied().collect()
    }
}
