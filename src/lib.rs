//! SCL Linearizer - stress linearization for thin-walled FE models
//!
//! Post-processes nodal stress and strain from a finite element solution
//! into the membrane, bending and peak categories used by ASME Section VIII
//! Div. 2 and ITER SDC-IC design-by-analysis rules:
//! - Node pairing between the two bounding surfaces of a wall (optimal
//!   assignment or geodesic distance over the mesh)
//! - Stress classification lines through every pair
//! - Nearest-node sampling of the field along each line
//! - Through-thickness integration into membrane, bending and peak
//!   components with von Mises, principal and triaxiality reductions
//! - Case maxima, a persistent result cache and parallel batches
//!
//! ## Example
//! ```rust
//! use scl_linearizer::prelude::*;
//!
//! // two 1x1 squares, 10 apart
//! let first: NodeSet = vec![
//!     Node::new(1, 0.0, 0.0, 0.0),
//!     Node::new(2, 1.0, 0.0, 0.0),
//! ].into_iter().collect();
//! let second: NodeSet = vec![
//!     Node::new(11, 0.0, 0.0, 10.0),
//!     Node::new(12, 1.0, 0.0, 10.0),
//! ].into_iter().collect();
//! let locations: NodeLocations = first.iter().chain(second.iter()).copied().collect();
//!
//! let mut result = NodalResult::new();
//! for id in [1, 2, 11, 12] {
//!     result.insert(id, NodalValues {
//!         coords: None,
//!         stress: [100.0, 50.0, 50.0, 0.0, 0.0, 0.0],
//!         elastic_strain: StrainRecord { components: [0.0; 6], eqv: 0.0 },
//!         plastic_strain: None,
//!     });
//! }
//!
//! let options = LinearizationOptions::default().with_npoints(5);
//! let linearizer = Linearizer::new(Geometry::new(first, second, locations), options).unwrap();
//! let record = linearizer.linearize("uniform", &CaseParameters::new(), &result).unwrap();
//!
//! assert!((record.summary.stress.membrane - 50.0).abs() < 1e-9);
//! ```

pub mod aggregate;
pub mod analysis;
pub mod cache;
pub mod case;
pub mod error;
pub mod integrate;
pub mod interpolate;
pub mod math;
pub mod mesh;
pub mod nodal;
pub mod pairing;
pub mod results;
pub mod scl;

// Re-export common types
pub mod prelude {
    pub use crate::aggregate::{BatchReport, CaseBatch, CaseFailure, CaseSpec, Geometry, Linearizer};
    pub use crate::analysis::{FieldKind, LinearizationOptions, PairingStrategy};
    pub use crate::cache::ResultCache;
    pub use crate::case::{format_identifier, CaseIdentity, CaseParameters, PlasticityModel};
    pub use crate::error::{LinResult, LinearizationError};
    pub use crate::integrate::ThicknessIntegrator;
    pub use crate::interpolate::NearestInterpolator;
    pub use crate::mesh::{ElementConnectivity, Node, NodeId, NodeLocations, NodeSet};
    pub use crate::nodal::{FieldProvider, JsonFieldProvider, NodalResult, NodalValues, StrainRecord};
    pub use crate::pairing::{pair_nodes, MeshGraph, NodePair, NodePairing};
    pub use crate::results::{CaseRecord, CaseSummary, LinearizedMaxima, LinearizedResult};
    pub use crate::scl::StressClassificationLine;
}
