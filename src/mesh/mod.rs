//! Mesh description consumed by the linearization pipeline

mod connectivity;
pub mod io;
mod node;

pub use connectivity::ElementConnectivity;
pub use node::{Node, NodeId, NodeLocations, NodeSet};
