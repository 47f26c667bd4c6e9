//! Linearization options

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinResult, LinearizationError};
use crate::mesh::NodeId;

pub use crate::nodal::FieldKind;
pub use crate::pairing::PairingStrategy;

/// Integration points per line used by the production pipeline
pub const DEFAULT_NPOINTS: usize = 47;

/// Options for one linearization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearizationOptions {
    /// Integration points per stress classification line
    pub npoints: usize,
    /// How top and bottom surface nodes are matched
    pub pairing: PairingStrategy,
    /// Restrict nodal data to these nodes before pairing (None = all)
    pub node_subset: Option<Vec<NodeId>>,
    /// Effective Poisson's ratio for equivalent strain
    pub effective_poisson_ratio: f64,
    /// Reuse cached results keyed by case identity
    pub use_cache: bool,
    /// Where cached results live
    pub cache_dir: Option<PathBuf>,
}

impl Default for LinearizationOptions {
    fn default() -> Self {
        Self {
            npoints: DEFAULT_NPOINTS,
            pairing: PairingStrategy::default(),
            node_subset: None,
            effective_poisson_ratio: 0.5,
            use_cache: true,
            cache_dir: None,
        }
    }
}

impl LinearizationOptions {
    /// Options for graph-distance pairing on curved hexahedral walls
    pub fn graph() -> Self {
        Self {
            pairing: PairingStrategy::Graph,
            ..Self::default()
        }
    }

    /// Load options from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> LinResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let options: Self = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> LinResult<()> {
        if self.npoints < 2 {
            return Err(LinearizationError::InvalidInput(format!(
                "npoints must be at least 2, got {}",
                self.npoints
            )));
        }
        if !(0.0..=0.5).contains(&self.effective_poisson_ratio) {
            return Err(LinearizationError::InvalidInput(format!(
                "effective Poisson's ratio must lie in [0, 0.5], got {}",
                self.effective_poisson_ratio
            )));
        }
        Ok(())
    }

    /// Set integration points per line
    pub fn with_npoints(mut self, npoints: usize) -> Self {
        self.npoints = npoints;
        self
    }

    pub fn with_pairing(mut self, pairing: PairingStrategy) -> Self {
        self.pairing = pairing;
        self
    }

    /// Restrict evaluation to a node subset
    pub fn with_subset(mut self, nodes: Vec<NodeId>) -> Self {
        self.node_subset = Some(nodes);
        self
    }

    pub fn with_poisson_ratio(mut self, nu: f64) -> Self {
        self.effective_poisson_ratio = nu;
        self
    }

    /// Cache results under `dir`
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self.use_cache = true;
        self
    }

    /// Always recompute
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Cache directory when caching is active
    pub fn active_cache_dir(&self) -> Option<&Path> {
        if self.use_cache {
            self.cache_dir.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LinearizationOptions::default();
        assert_eq!(options.npoints, 47);
        assert_eq!(options.pairing, PairingStrategy::Assignment);
        assert_eq!(options.effective_poisson_ratio, 0.5);
        assert!(options.active_cache_dir().is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: LinearizationOptions =
            serde_json::from_str(r#"{"npoints": 11, "pairing": "Graph"}"#).unwrap();
        assert_eq!(options.npoints, 11);
        assert_eq!(options.pairing, PairingStrategy::Graph);
        assert!(options.use_cache);
    }

    #[test]
    fn test_validate_rejects_single_point() {
        assert!(LinearizationOptions::default().with_npoints(1).validate().is_err());
        assert!(LinearizationOptions::default().with_poisson_ratio(0.7).validate().is_err());
    }

    #[test]
    fn test_without_cache_disables_dir() {
        let options = LinearizationOptions::default()
            .with_cache_dir("/tmp/cache")
            .without_cache();
        assert!(options.active_cache_dir().is_none());
    }
}
