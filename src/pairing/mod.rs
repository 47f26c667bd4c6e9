//! Node pairing between the two bounding surfaces of a thin section
//!
//! The smaller surface is the source: each of its nodes receives one node
//! of the other surface. Pairs are always reported in argument order
//! (`first` from the first set, `second` from the second) regardless of
//! which set was the source.
//!
//! Two strategies are available:
//! - [`PairingStrategy::Assignment`] solves the linear assignment problem on
//!   straight-line distances, giving a global optimum with no target reused.
//! - [`PairingStrategy::Graph`] sends every source node to its nearest target
//!   by path length along element edges. Targets may repeat.

mod assignment;
mod graph;
mod reindex;

pub use assignment::linear_sum_assignment;
pub use graph::MeshGraph;
pub use reindex::Reindexer;

use std::collections::HashSet;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{LinResult, LinearizationError};
use crate::mesh::{Node, NodeId, NodeSet};

/// How nodes of the two surfaces are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// Global minimum of summed Euclidean distance
    Assignment,
    /// Nearest target by geodesic distance over the mesh graph
    Graph,
    /// Sparse assignment restricted to the k nearest candidates
    NearestK(usize),
}

impl Default for PairingStrategy {
    fn default() -> Self {
        Self::Assignment
    }
}

/// One matched node pair and its pairing cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePair {
    pub first: Node,
    pub second: Node,
    /// Euclidean or geodesic distance, depending on the strategy
    pub distance: f64,
}

impl NodePair {
    /// Straight-line midpoint of the pair
    pub fn midpoint(&self) -> [f64; 3] {
        let a = self.first.coords();
        let b = self.second.coords();
        [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1]), 0.5 * (a[2] + b[2])]
    }
}

/// Matching between two node sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePairing {
    pairs: Vec<NodePair>,
}

impl NodePairing {
    pub fn new(pairs: Vec<NodePair>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[NodePair] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodePair> {
        self.pairs.iter()
    }

    /// `(first, second)` node ids of every pair
    pub fn ids(&self) -> Vec<(NodeId, NodeId)> {
        self.pairs.iter().map(|p| (p.first.id, p.second.id)).collect()
    }

    pub fn first_coords(&self) -> Vec<[f64; 3]> {
        self.pairs.iter().map(|p| p.first.coords()).collect()
    }

    pub fn second_coords(&self) -> Vec<[f64; 3]> {
        self.pairs.iter().map(|p| p.second.coords()).collect()
    }

    /// Summed pairing cost
    pub fn total_distance(&self) -> f64 {
        self.pairs.iter().map(|p| p.distance).sum()
    }

    /// True when no node is used twice on either side
    pub fn is_injective(&self) -> bool {
        let mut firsts = HashSet::new();
        let mut seconds = HashSet::new();
        self.pairs
            .iter()
            .all(|p| firsts.insert(p.first.id) && seconds.insert(p.second.id))
    }

    /// Keep only pairs whose nodes both satisfy `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.pairs.retain(|p| keep(p.first.id) && keep(p.second.id));
    }
}

/// Pair two node sets with the given strategy.
///
/// `mesh` is required by [`PairingStrategy::Graph`] and ignored otherwise.
pub fn pair_nodes(
    first: &NodeSet,
    second: &NodeSet,
    strategy: PairingStrategy,
    mesh: Option<&MeshGraph>,
) -> LinResult<NodePairing> {
    match strategy {
        PairingStrategy::Assignment => pair_by_assignment(first, second),
        PairingStrategy::Graph => {
            let mesh = mesh.ok_or_else(|| {
                LinearizationError::InvalidInput(
                    "graph pairing needs element connectivity".into(),
                )
            })?;
            pair_by_graph(first, second, mesh)
        }
        PairingStrategy::NearestK(k) => Err(LinearizationError::NotImplemented(format!(
            "sparse pairing over the {k} closest candidates"
        ))),
    }
}

/// Globally optimal matching on Euclidean distance
pub fn pair_by_assignment(first: &NodeSet, second: &NodeSet) -> LinResult<NodePairing> {
    check_non_empty(first, second)?;
    let (source, target, swapped) = orient(first, second);

    let cost = DMatrix::from_fn(source.len(), target.len(), |i, j| {
        source.nodes()[i].distance_to(&target.nodes()[j])
    });
    let assignment = linear_sum_assignment(&cost)?;

    let pairs = assignment
        .iter()
        .enumerate()
        .map(|(i, &j)| make_pair(source.nodes()[i], target.nodes()[j], cost[(i, j)], swapped))
        .collect();

    let pairing = NodePairing::new(pairs);
    log::debug!(
        "assignment pairing: {} pairs, total distance {:.6e}",
        pairing.len(),
        pairing.total_distance()
    );
    Ok(pairing)
}

/// Nearest-by-geodesic-distance matching over the mesh graph
pub fn pair_by_graph(first: &NodeSet, second: &NodeSet, mesh: &MeshGraph) -> LinResult<NodePairing> {
    check_non_empty(first, second)?;
    let (source, target, swapped) = orient(first, second);
    let target_ids = target.ids();

    let pairs = source
        .iter()
        .map(|&node| {
            let (k, distance) = mesh.nearest(node.id, &target_ids)?;
            Ok(make_pair(node, target.nodes()[k], distance, swapped))
        })
        .collect::<LinResult<Vec<_>>>()?;

    let pairing = NodePairing::new(pairs);
    log::debug!("graph pairing: {} pairs", pairing.len());
    Ok(pairing)
}

fn check_non_empty(first: &NodeSet, second: &NodeSet) -> LinResult<()> {
    if first.is_empty() || second.is_empty() {
        return Err(LinearizationError::InvalidInput(format!(
            "cannot pair empty node sets ({} and {} nodes)",
            first.len(),
            second.len()
        )));
    }
    Ok(())
}

/// Smaller set first; the flag records whether arguments were swapped
fn orient<'a>(first: &'a NodeSet, second: &'a NodeSet) -> (&'a NodeSet, &'a NodeSet, bool) {
    if first.len() <= second.len() {
        (first, second, false)
    } else {
        (second, first, true)
    }
}

fn make_pair(source: Node, target: Node, distance: f64, swapped: bool) -> NodePair {
    if swapped {
        NodePair { first: target, second: source, distance }
    } else {
        NodePair { first: source, second: target, distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ElementConnectivity, NodeLocations};

    fn row(ids: std::ops::Range<u32>, z: f64) -> NodeSet {
        ids.clone()
            .map(|id| Node::new(id, (id - ids.start) as f64, 0.0, z))
            .collect()
    }

    #[test]
    fn test_equal_sets_pair_vertically() {
        let top = row(1..5, 10.0);
        let bottom = row(11..15, 0.0);
        let pairing = pair_by_assignment(&top, &bottom).unwrap();
        assert_eq!(pairing.ids(), vec![(1, 11), (2, 12), (3, 13), (4, 14)]);
        assert!(pairing.is_injective());
        assert!((pairing.total_distance() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairs_keep_argument_order_when_swapped() {
        let big = row(1..6, 0.0);
        let small = row(21..23, 1.0);
        let pairing = pair_by_assignment(&big, &small).unwrap();
        assert_eq!(pairing.len(), 2);
        assert_eq!(pairing.ids(), vec![(1, 21), (2, 22)]);
    }

    #[test]
    fn test_empty_set_is_invalid_input() {
        let empty = NodeSet::default();
        let other = row(1..3, 0.0);
        assert!(matches!(
            pair_by_assignment(&empty, &other),
            Err(LinearizationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_nearest_k_is_not_implemented() {
        let a = row(1..3, 0.0);
        let b = row(5..7, 1.0);
        assert!(matches!(
            pair_nodes(&a, &b, PairingStrategy::NearestK(10), None),
            Err(LinearizationError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_graph_strategy_requires_mesh() {
        let a = row(1..3, 0.0);
        let b = row(5..7, 1.0);
        assert!(matches!(
            pair_nodes(&a, &b, PairingStrategy::Graph, None),
            Err(LinearizationError::InvalidInput(_))
        ));
    }

    /// Strip of two quads; element diagonals are edges too, so node 3 sees
    /// both 12 and 13 and must take the shorter one.
    #[test]
    fn test_graph_pairing_follows_elements() {
        let nodes = vec![
            Node::new(1, 0.0, 1.0, 0.0),
            Node::new(2, 1.0, 1.0, 0.0),
            Node::new(3, 2.0, 1.0, 0.0),
            Node::new(11, 0.0, 0.0, 0.0),
            Node::new(12, 1.0, 0.0, 0.0),
            Node::new(13, 2.0, 0.0, 0.0),
        ];
        let locations: NodeLocations = nodes.iter().copied().collect();
        let connectivity = ElementConnectivity::new(vec![vec![1, 2, 12, 11], vec![2, 3, 13, 12]]);
        let mesh = MeshGraph::build(&connectivity, &locations).unwrap();
        assert_eq!(mesh.node_count(), 6);

        let top: NodeSet = nodes[..3].iter().copied().collect();
        let bottom: NodeSet = nodes[3..].iter().copied().collect();
        let pairing = pair_by_graph(&top, &bottom, &mesh).unwrap();
        assert_eq!(pairing.ids(), vec![(1, 11), (2, 12), (3, 13)]);
        for pair in pairing.iter() {
            assert!((pair.distance - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_graph_pairing_may_reuse_targets() {
        let nodes = vec![
            Node::new(1, 0.0, 1.0, 0.0),
            Node::new(2, 0.2, 1.0, 0.0),
            Node::new(11, 0.0, 0.0, 0.0),
            Node::new(12, 5.0, 0.0, 0.0),
        ];
        let locations: NodeLocations = nodes.iter().copied().collect();
        let connectivity = ElementConnectivity::new(vec![vec![1, 2, 11], vec![2, 11, 12]]);
        let mesh = MeshGraph::build(&connectivity, &locations).unwrap();

        let top: NodeSet = nodes[..2].iter().copied().collect();
        let bottom: NodeSet = nodes[2..].iter().copied().collect();
        let pairing = pair_by_graph(&top, &bottom, &mesh).unwrap();
        assert_eq!(pairing.ids(), vec![(1, 11), (2, 11)]);
        assert!(!pairing.is_injective());
    }
}
