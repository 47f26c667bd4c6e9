//! Per-case linearization pipeline and batch runner
//!
//! For each solved case the nodal field is reduced to its evaluated nodes
//! (and the optional node subset), the two surfaces are paired, a stress
//! classification line is laid through every pair and the stress and
//! strain fields are sampled along it and integrated through the
//! thickness. Case maxima land in a [`CaseSummary`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::{LinearizationOptions, PairingStrategy};
use crate::cache::ResultCache;
use crate::case::{file_checksum, CaseIdentity, CaseParameters};
use crate::error::{LinResult, LinearizationError};
use crate::integrate::ThicknessIntegrator;
use crate::interpolate::NearestInterpolator;
use crate::math::{self, VOIGT_LEN};
use crate::mesh::{io, ElementConnectivity, NodeId, NodeLocations, NodeSet};
use crate::nodal::{FieldKind, FieldProvider, NodalResult};
use crate::pairing::{pair_nodes, MeshGraph, NodePairing};
use crate::results::{CaseRecord, CaseSummary, LinearizedResult};
use crate::scl::{build_scl_points, lines_from_pairing};

/// The two bounding surfaces of the wall and the mesh they live in
#[derive(Debug, Clone)]
pub struct Geometry {
    /// First surface; lines start here
    pub first: NodeSet,
    /// Second surface; lines end here
    pub second: NodeSet,
    /// Coordinates of every node
    pub locations: NodeLocations,
    /// Edge graph for geodesic pairing
    pub mesh: Option<MeshGraph>,
    /// Input file checksums, part of every case identity
    pub checksums: BTreeMap<String, Uuid>,
}

impl Geometry {
    pub fn new(first: NodeSet, second: NodeSet, locations: NodeLocations) -> Self {
        Self {
            first,
            second,
            locations,
            mesh: None,
            checksums: BTreeMap::new(),
        }
    }

    /// Attach element connectivity for graph pairing
    pub fn with_connectivity(mut self, connectivity: &ElementConnectivity) -> LinResult<Self> {
        self.mesh = Some(MeshGraph::build(connectivity, &self.locations)?);
        Ok(self)
    }

    /// Read surfaces, node locations and optional connectivity from files
    pub fn from_files(
        first: impl AsRef<Path>,
        second: impl AsRef<Path>,
        locations: impl AsRef<Path>,
        connectivity: Option<&Path>,
    ) -> LinResult<Self> {
        let mut geometry = Self::new(
            io::read_node_set(first.as_ref())?,
            io::read_node_set(second.as_ref())?,
            io::read_node_locations(locations.as_ref())?,
        );
        geometry.checksums.insert("first".into(), file_checksum(first.as_ref())?);
        geometry.checksums.insert("second".into(), file_checksum(second.as_ref())?);
        geometry.checksums.insert("locations".into(), file_checksum(locations.as_ref())?);
        if let Some(path) = connectivity {
            geometry = geometry.with_connectivity(&io::read_connectivity(path)?)?;
            geometry.checksums.insert("connectivity".into(), file_checksum(path)?);
        }
        log::info!(
            "geometry: {} + {} surface nodes, {} located nodes",
            geometry.first.len(),
            geometry.second.len(),
            geometry.locations.len()
        );
        Ok(geometry)
    }
}

/// Option fields that change the linearized numbers
#[derive(Serialize)]
struct ResultAffectingOptions<'a> {
    npoints: usize,
    pairing: PairingStrategy,
    node_subset: &'a Option<Vec<NodeId>>,
    effective_poisson_ratio: f64,
}

/// Runs the linearization pipeline for cases on a fixed geometry
#[derive(Debug)]
pub struct Linearizer {
    geometry: Geometry,
    options: LinearizationOptions,
    cache: Option<ResultCache>,
}

impl Linearizer {
    pub fn new(geometry: Geometry, options: LinearizationOptions) -> LinResult<Self> {
        options.validate()?;
        let cache = options
            .active_cache_dir()
            .map(|dir| ResultCache::open(dir))
            .transpose()?;
        Ok(Self { geometry, options, cache })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn options(&self) -> &LinearizationOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Identity of a case on this geometry with these options
    pub fn identity(&self, name: &str, parameters: &CaseParameters, result: &NodalResult) -> LinResult<CaseIdentity> {
        let options = ResultAffectingOptions {
            npoints: self.options.npoints,
            pairing: self.options.pairing,
            node_subset: &self.options.node_subset,
            effective_poisson_ratio: self.options.effective_poisson_ratio,
        };
        let mut identity = CaseIdentity::new(name, parameters.clone())
            .with_checksum("options", content_checksum(&options)?)
            .with_checksum("nodal_result", content_checksum(result)?);
        for (label, checksum) in &self.geometry.checksums {
            identity = identity.with_checksum(label.clone(), *checksum);
        }
        Ok(identity)
    }

    /// Fetch a case from `provider` and linearize it, reusing a cached
    /// record when one exists
    pub fn evaluate<P: FieldProvider + ?Sized>(
        &self,
        name: &str,
        parameters: &CaseParameters,
        provider: &P,
    ) -> LinResult<CaseRecord> {
        let result = provider.get_case(name)?;
        self.evaluate_result(name, parameters, &result)
    }

    /// Linearize an already loaded case, reusing a cached record when one
    /// exists
    pub fn evaluate_result(
        &self,
        name: &str,
        parameters: &CaseParameters,
        result: &NodalResult,
    ) -> LinResult<CaseRecord> {
        let Some(cache) = &self.cache else {
            return self.linearize(name, parameters, result);
        };

        let identity = self.identity(name, parameters, result)?;
        if let Some(record) = cache.load::<CaseRecord>(&identity)? {
            log::info!("case '{name}': cache hit");
            return Ok(record);
        }
        log::info!("case '{name}': cache miss");

        let record = self.linearize(name, parameters, result)?;
        if let Err(err) = cache.store(&identity, &record) {
            log::warn!("case '{name}': could not cache result: {err}");
        }
        Ok(record)
    }

    /// Drop the cached record of a case, if any
    pub fn invalidate(&self, name: &str, parameters: &CaseParameters, result: &NodalResult) -> LinResult<bool> {
        match &self.cache {
            Some(cache) => cache.invalidate(&self.identity(name, parameters, result)?),
            None => Ok(false),
        }
    }

    /// Run the full pipeline without touching the cache
    pub fn linearize(&self, name: &str, parameters: &CaseParameters, result: &NodalResult) -> LinResult<CaseRecord> {
        let evaluated = self.evaluated_nodes(result);
        log::debug!(
            "case '{name}': {} of {} nodes evaluated",
            evaluated.len(),
            result.len()
        );

        let pairing = self.pair(&evaluated)?;
        let lines = lines_from_pairing(&pairing);
        let points = build_scl_points(&lines, self.options.npoints)?;
        log::info!(
            "case '{name}': {} stress classification lines of {} points",
            lines.len(),
            self.options.npoints
        );

        let (source, values) = self.source_fields(result, &evaluated)?;
        let samples = NearestInterpolator::new(&source, values)?.interpolate(&points)?;
        let stress_samples = samples.columns(0, VOIGT_LEN).into_owned();
        let strain_samples = samples.columns(VOIGT_LEN, VOIGT_LEN).into_owned();

        let npoints = self.options.npoints;
        let stress = LinearizedResult::from_integrator(
            &ThicknessIntegrator::new(&stress_samples, &points, npoints)?,
            &lines,
            FieldKind::Stress,
        )?;
        let strain = LinearizedResult::from_integrator(
            &ThicknessIntegrator::new(&strain_samples, &points, npoints)?,
            &lines,
            FieldKind::Strain,
        )?;

        let nu = self.options.effective_poisson_ratio;
        let (max_eqv_stress, max_eqv_strain) = match &self.options.node_subset {
            Some(subset) => (
                Some(result.max_eqv_stress(Some(subset.as_slice()))?),
                Some(result.max_eqv_strain(Some(subset.as_slice()))?),
            ),
            None => (None, None),
        };
        let summary = CaseSummary {
            case: name.to_string(),
            parameters: parameters.clone(),
            stress: stress.maxima(math::von_mises_full)?,
            strain: strain.maxima(|e| math::von_mises_strain(e, nu))?,
            max_eqv_stress,
            max_eqv_strain,
        };
        log::debug!(
            "case '{name}': max membrane {:.4e}, max linearized {:.4e}",
            summary.stress.membrane,
            summary.stress.linearized
        );

        Ok(CaseRecord { stress, strain, summary })
    }

    /// Evaluated nodes, narrowed to the configured subset
    fn evaluated_nodes(&self, result: &NodalResult) -> HashSet<NodeId> {
        let mut nodes: HashSet<NodeId> = result.valid_nodes().into_iter().collect();
        if let Some(subset) = &self.options.node_subset {
            let subset: HashSet<NodeId> = subset.iter().copied().collect();
            nodes.retain(|id| subset.contains(id));
        }
        nodes
    }

    fn pair(&self, evaluated: &HashSet<NodeId>) -> LinResult<NodePairing> {
        let first = self.geometry.first.restrict(evaluated);
        let second = self.geometry.second.restrict(evaluated);
        let pairing = pair_nodes(&first, &second, self.options.pairing, self.geometry.mesh.as_ref())?;
        log::info!(
            "paired {} of {} / {} surface nodes",
            pairing.len(),
            first.len(),
            second.len()
        );
        Ok(pairing)
    }

    /// Coordinates (`M x 3`) and stress | strain values (`M x 12`) of the
    /// evaluated nodes, in ascending id order
    fn source_fields(&self, result: &NodalResult, evaluated: &HashSet<NodeId>) -> LinResult<(DMatrix<f64>, DMatrix<f64>)> {
        let mut ids: Vec<NodeId> = evaluated.iter().copied().collect();
        ids.sort_unstable();

        let mut coords = DMatrix::zeros(ids.len(), 3);
        for (r, &id) in ids.iter().enumerate() {
            let point = match self.geometry.locations.get(id) {
                Ok(point) => point,
                Err(err) => result.get(id).and_then(|v| v.coords).ok_or(err)?,
            };
            for (c, x) in point.iter().enumerate() {
                coords[(r, c)] = *x;
            }
        }

        let stress = result.field_matrix(&ids, FieldKind::Stress)?;
        let strain = result.field_matrix(&ids, FieldKind::Strain)?;
        let mut values = DMatrix::zeros(ids.len(), 2 * VOIGT_LEN);
        values.columns_mut(0, VOIGT_LEN).copy_from(&stress);
        values.columns_mut(VOIGT_LEN, VOIGT_LEN).copy_from(&strain);
        Ok((coords, values))
    }
}

fn content_checksum<T: Serialize + ?Sized>(value: &T) -> LinResult<Uuid> {
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &serde_json::to_vec(value)?))
}

/// One case of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSpec {
    pub name: String,
    pub parameters: CaseParameters,
}

impl CaseSpec {
    pub fn new(name: impl Into<String>, parameters: CaseParameters) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// A case the batch skipped, and why
#[derive(Debug)]
pub struct CaseFailure {
    pub case: String,
    pub error: LinearizationError,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Summaries of the completed cases, in input order
    pub summaries: Vec<CaseSummary>,
    /// Cases skipped over data problems
    pub failures: Vec<CaseFailure>,
}

/// Independent cases evaluated in parallel against one provider
pub struct CaseBatch<'a, P: ?Sized> {
    linearizer: &'a Linearizer,
    provider: &'a P,
}

impl<'a, P: FieldProvider + Sync + ?Sized> CaseBatch<'a, P> {
    pub fn new(linearizer: &'a Linearizer, provider: &'a P) -> Self {
        Self { linearizer, provider }
    }

    /// Evaluate every case. Cases failing on their own data are logged and
    /// skipped; any other error aborts the batch.
    pub fn run(&self, cases: &[CaseSpec]) -> LinResult<BatchReport> {
        log::info!("linearizing {} cases", cases.len());
        let outcomes: Vec<LinResult<CaseRecord>> = cases
            .par_iter()
            .map(|case| self.linearizer.evaluate(&case.name, &case.parameters, self.provider))
            .collect();

        let mut report = BatchReport::default();
        for (case, outcome) in cases.iter().zip(outcomes) {
            match outcome {
                Ok(record) => report.summaries.push(record.summary),
                Err(err) if err.is_case_local() => {
                    log::warn!("skipping case '{}': {err}", case.name);
                    report.failures.push(CaseFailure {
                        case: case.name.clone(),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        log::info!(
            "{} cases linearized, {} skipped",
            report.summaries.len(),
            report.failures.len()
        );
        Ok(report)
    }
}
