//! Geodesic distances over the mesh edge graph
//!
//! Straight-line distance between surfaces is misleading on curved walls
//! meshed with bricks; walking along element edges follows the wall.

use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::error::{LinResult, LinearizationError};
use crate::mesh::{ElementConnectivity, NodeId, NodeLocations};

use super::Reindexer;

/// Undirected node graph with Euclidean edge lengths between nodes that
/// share an element
#[derive(Debug, Clone)]
pub struct MeshGraph {
    graph: UnGraph<NodeId, f64>,
    reindexer: Reindexer,
}

impl MeshGraph {
    /// Build the graph; every connected node must have coordinates
    pub fn build(connectivity: &ElementConnectivity, locations: &NodeLocations) -> LinResult<Self> {
        let reindexer = Reindexer::from_node_list(connectivity.nodes());
        let mut graph: UnGraph<NodeId, f64> = UnGraph::with_capacity(reindexer.len(), 0);
        for i in 0..reindexer.len() {
            graph.add_node(reindexer.backward(i));
        }

        for (a, b) in connectivity.edges() {
            let pa = locations.node(a)?;
            let pb = locations.node(b)?;
            let ia = NodeIndex::new(reindexer.forward(a)?);
            let ib = NodeIndex::new(reindexer.forward(b)?);
            graph.add_edge(ia, ib, pa.distance_to(&pb));
        }

        log::debug!(
            "mesh graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self { graph, reindexer })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nearest target by path length from `source`, with its distance.
    /// Ties keep the earliest target in `targets`.
    pub fn nearest(&self, source: NodeId, targets: &[NodeId]) -> LinResult<(usize, f64)> {
        let start = NodeIndex::new(self.reindexer.forward(source)?);
        let distances = dijkstra(&self.graph, start, None, |e| *e.weight());

        let mut best: Option<(usize, f64)> = None;
        for (k, &target) in targets.iter().enumerate() {
            let index = NodeIndex::new(self.reindexer.forward(target)?);
            if let Some(&d) = distances.get(&index) {
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((k, d));
                }
            }
        }

        best.ok_or_else(|| {
            LinearizationError::InvalidInput(format!(
                "no node of the opposite surface is reachable from node {source}"
            ))
        })
    }
}
