//! Nodal results handed over by the FE solver
//!
//! The solver itself is an external collaborator; this module only holds
//! the per-node stress and strain it produced and the [`FieldProvider`]
//! seam through which cases are fetched.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{LinResult, LinearizationError};
use crate::integrate::ThicknessIntegrator;
use crate::math::{self, Voigt};
use crate::mesh::{Node, NodeId, NodeLocations};

/// Which nodal tensor field to linearize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Nodal stress
    Stress,
    /// Total strain, elastic plus plastic
    Strain,
}

/// Strain tensor with the solver's scalar equivalent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrainRecord {
    #[serde(with = "nan_as_null")]
    pub components: Voigt,
    #[serde(default = "nan")]
    pub eqv: f64,
}

/// Everything the solver reports at one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodalValues {
    #[serde(default)]
    pub coords: Option<[f64; 3]>,
    #[serde(with = "nan_as_null")]
    pub stress: Voigt,
    pub elastic_strain: StrainRecord,
    #[serde(default)]
    pub plastic_strain: Option<StrainRecord>,
}

impl NodalValues {
    /// Midside nodes are not evaluated by the solver and carry NaN stress
    pub fn is_evaluated(&self) -> bool {
        self.stress.iter().all(|s| s.is_finite())
    }

    /// Elastic plus plastic strain tensor
    pub fn total_strain(&self) -> Voigt {
        match &self.plastic_strain {
            Some(plastic) => math::add(&self.elastic_strain.components, &plastic.components),
            None => self.elastic_strain.components,
        }
    }

    pub fn field(&self, kind: FieldKind) -> Voigt {
        match kind {
            FieldKind::Stress => self.stress,
            FieldKind::Strain => self.total_strain(),
        }
    }
}

/// Stress and strain at every node of one solved load case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodalResult {
    nodes: BTreeMap<NodeId, NodalValues>,
}

impl NodalResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, values: NodalValues) {
        self.nodes.insert(id, values);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodalValues> {
        self.nodes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodalValues)> {
        self.nodes.iter().map(|(&id, v)| (id, v))
    }

    /// Ids of every node with a finite stress result, ascending
    pub fn valid_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, v)| v.is_evaluated())
            .map(|(&id, _)| id)
            .collect()
    }

    pub fn is_valid(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(NodalValues::is_evaluated)
    }

    /// Only the nodes in `keep`
    pub fn restrict(&self, keep: &HashSet<NodeId>) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|(id, _)| keep.contains(id))
                .map(|(&id, v)| (id, *v))
                .collect(),
        }
    }

    /// Only the evaluated nodes
    pub fn evaluated(&self) -> Self {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|(_, v)| v.is_evaluated())
                .map(|(&id, v)| (id, *v))
                .collect(),
        }
    }

    fn evaluated_node(&self, id: NodeId) -> LinResult<&NodalValues> {
        let values = self
            .nodes
            .get(&id)
            .ok_or_else(|| LinearizationError::MissingData(format!("node {id} has no result")))?;
        if !values.is_evaluated() {
            return Err(LinearizationError::MissingData(format!(
                "node {id} was not evaluated by the solver (midside node)"
            )));
        }
        Ok(values)
    }

    /// Stress tensor `[xx, yy, zz, xy, yz, xz]` at a node
    pub fn stress_tensor(&self, id: NodeId) -> LinResult<Voigt> {
        Ok(self.evaluated_node(id)?.stress)
    }

    /// Total (elastic plus plastic) strain tensor at a node
    pub fn strain_tensor(&self, id: NodeId) -> LinResult<Voigt> {
        Ok(self.evaluated_node(id)?.total_strain())
    }

    pub fn field_tensor(&self, id: NodeId, kind: FieldKind) -> LinResult<Voigt> {
        Ok(self.evaluated_node(id)?.field(kind))
    }

    /// von Mises stress at a node
    pub fn eqv_stress(&self, id: NodeId) -> LinResult<f64> {
        Ok(math::von_mises_full(&self.stress_tensor(id)?))
    }

    /// Elastic plus plastic equivalent strain reported by the solver
    pub fn total_eqv_strain(&self, id: NodeId) -> LinResult<f64> {
        let values = self.evaluated_node(id)?;
        let plastic = values.plastic_strain.map_or(0.0, |p| p.eqv);
        Ok(values.elastic_strain.eqv + plastic)
    }

    /// Largest nodal von Mises stress over the valid nodes of `subset`
    /// (all nodes when `None`)
    pub fn max_eqv_stress(&self, subset: Option<&[NodeId]>) -> LinResult<f64> {
        self.max_over(subset, |id| self.eqv_stress(id))
    }

    /// Largest nodal equivalent strain over the valid nodes of `subset`
    pub fn max_eqv_strain(&self, subset: Option<&[NodeId]>) -> LinResult<f64> {
        self.max_over(subset, |id| self.total_eqv_strain(id))
    }

    fn max_over(&self, subset: Option<&[NodeId]>, value: impl Fn(NodeId) -> LinResult<f64>) -> LinResult<f64> {
        let ids: Vec<NodeId> = match subset {
            Some(ids) => ids.iter().copied().filter(|&id| self.is_valid(id)).collect(),
            None => self.valid_nodes(),
        };
        let mut max: Option<f64> = None;
        for id in ids {
            let v = value(id)?;
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        max.ok_or_else(|| LinearizationError::MissingData("no evaluated node in the requested subset".into()))
    }

    /// Field rows for `ids`, one row of 6 components per node
    pub fn field_matrix(&self, ids: &[NodeId], kind: FieldKind) -> LinResult<DMatrix<f64>> {
        let mut out = DMatrix::zeros(ids.len(), 6);
        for (r, &id) in ids.iter().enumerate() {
            for (c, v) in self.field_tensor(id, kind)?.iter().enumerate() {
                out[(r, c)] = *v;
            }
        }
        Ok(out)
    }

    /// Linearized (membrane plus bending) stress across one chain of nodes
    /// running through the wall, at the first node of the chain
    pub fn linearized_stress_tensor(&self, nodes: &[NodeId], locations: &DMatrix<f64>) -> LinResult<Voigt> {
        self.linearized_tensor(nodes, locations, FieldKind::Stress)
    }

    /// Linearized total strain across one chain of nodes
    pub fn linearized_strain_tensor(&self, nodes: &[NodeId], locations: &DMatrix<f64>) -> LinResult<Voigt> {
        self.linearized_tensor(nodes, locations, FieldKind::Strain)
    }

    fn linearized_tensor(&self, nodes: &[NodeId], locations: &DMatrix<f64>, kind: FieldKind) -> LinResult<Voigt> {
        let samples = self.field_matrix(nodes, kind)?;
        let integrator = ThicknessIntegrator::new(&samples, locations, nodes.len())?;
        let linear = integrator.membrane() + integrator.bending();
        Ok(std::array::from_fn(|i| linear[(0, i)]))
    }

    /// Coordinates of the nodes that carry them
    pub fn locations(&self) -> NodeLocations {
        self.nodes
            .iter()
            .filter_map(|(&id, v)| v.coords.map(|[x, y, z]| Node::new(id, x, y, z)))
            .collect()
    }
}

/// Source of solved load cases, keyed by case name
pub trait FieldProvider {
    fn get_case(&self, name: &str) -> LinResult<NodalResult>;
}

impl FieldProvider for HashMap<String, NodalResult> {
    fn get_case(&self, name: &str) -> LinResult<NodalResult> {
        self.get(name)
            .cloned()
            .ok_or_else(|| LinearizationError::CaseNotFound(name.to_string()))
    }
}

/// Reads `<dir>/<case>.json` files written by the solver driver
#[derive(Debug, Clone)]
pub struct JsonFieldProvider {
    dir: PathBuf,
}

impl JsonFieldProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn case_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FieldProvider for JsonFieldProvider {
    fn get_case(&self, name: &str) -> LinResult<NodalResult> {
        let path = self.case_path(name);
        if !path.exists() {
            return Err(LinearizationError::CaseNotFound(format!(
                "{name} (no file at {})",
                path.display()
            )));
        }
        let text = fs::read_to_string(&path)?;
        let result: NodalResult = serde_json::from_str(&text)?;
        log::debug!("loaded case '{}' with {} nodes", name, result.len());
        Ok(result)
    }
}

fn nan() -> f64 {
    f64::NAN
}

/// JSON has no NaN; non-evaluated components travel as `null`
mod nan_as_null {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::math::Voigt;

    pub fn serialize<S: Serializer>(v: &Voigt, serializer: S) -> Result<S::Ok, S::Error> {
        let values: Vec<Option<f64>> = v.iter().map(|x| x.is_finite().then_some(*x)).collect();
        serializer.collect_seq(values)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Voigt, D::Error> {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        if values.len() != 6 {
            return Err(D::Error::invalid_length(values.len(), &"6 tensor components"));
        }
        Ok(std::array::from_fn(|i| values[i].unwrap_or(f64::NAN)))
    }
}
