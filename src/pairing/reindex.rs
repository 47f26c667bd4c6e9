//! Dense re-numbering of solver node ids
//!
//! Matrix rows and graph vertices are addressed by position, so node ids
//! are mapped onto `0..n` before pairing and mapped back afterwards.

use std::collections::HashMap;

use crate::error::{LinResult, LinearizationError};
use crate::mesh::NodeId;

#[derive(Debug, Clone, Default)]
pub struct Reindexer {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
}

impl Reindexer {
    /// Build from a node list; ids are sorted and deduplicated first
    pub fn from_node_list(ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut ids: Vec<NodeId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, index }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dense index of a node id
    pub fn forward(&self, id: NodeId) -> LinResult<usize> {
        self.index.get(&id).copied().ok_or_else(|| {
            LinearizationError::InvalidInput(format!("node {id} is not part of the mesh graph"))
        })
    }

    /// Node id of a dense index
    pub fn backward(&self, index: usize) -> NodeId {
        self.ids[index]
    }

    pub fn forward_all(&self, ids: &[NodeId]) -> LinResult<Vec<usize>> {
        ids.iter().map(|&id| self.forward(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindex_round_trip() {
        let r = Reindexer::from_node_list(vec![592, 104, 77, 104]);
        assert_eq!(r.len(), 3);
        assert_eq!(r.forward(77).unwrap(), 0);
        assert_eq!(r.forward(592).unwrap(), 2);
        for id in [77, 104, 592] {
            assert_eq!(r.backward(r.forward(id).unwrap()), id);
        }
        assert!(r.forward(1).is_err());
    }
}
