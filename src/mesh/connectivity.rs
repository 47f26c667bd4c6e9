//! Element connectivity - which nodes share an element

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Node lists of every element in a mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementConnectivity {
    elements: Vec<Vec<NodeId>>,
}

impl ElementConnectivity {
    pub fn new(elements: Vec<Vec<NodeId>>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[Vec<NodeId>] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Every distinct node referenced by an element, ascending
    pub fn nodes(&self) -> BTreeSet<NodeId> {
        self.elements.iter().flatten().copied().collect()
    }

    /// Unordered node pairs sharing at least one element, each reported once
    /// with the smaller id first
    pub fn edges(&self) -> BTreeSet<(NodeId, NodeId)> {
        let mut edges = BTreeSet::new();
        for element in &self.elements {
            for (i, &a) in element.iter().enumerate() {
                for &b in &element[i + 1..] {
                    if a != b {
                        edges.insert((a.min(b), a.max(b)));
                    }
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_deduplicated() {
        let conn = ElementConnectivity::new(vec![vec![1, 2, 3], vec![3, 2, 4]]);
        let edges = conn.edges();
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&(2, 3)));
        assert!(edges.contains(&(1, 3)));
        assert!(!edges.contains(&(1, 4)));
    }
}
