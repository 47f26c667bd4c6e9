//! Result types for stress linearization

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::case::CaseParameters;
use crate::error::{LinResult, LinearizationError};
use crate::integrate::ThicknessIntegrator;
use crate::math::Voigt;
use crate::mesh::NodeId;
use crate::nodal::FieldKind;
use crate::scl::StressClassificationLine;

/// Linearized field along every stress classification line of a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearizedResult {
    pub field: FieldKind,
    /// Membrane tensor, one per line
    pub membrane: Vec<Voigt>,
    /// Bending tensor on the first surface, one per line
    pub bending: Vec<Voigt>,
    /// Peak tensor on the first and second surface
    pub peak: Vec<[Voigt; 2]>,
    /// Principal values of membrane + bending on both surfaces, ascending
    pub principal: Vec<[[f64; 3]; 2]>,
    /// Mean triaxiality factor; `None` for strain fields and hydrostatic lines
    pub triaxiality_factor: Vec<Option<f64>>,
    /// Line midpoints
    pub location: Vec<[f64; 3]>,
    /// Surface nodes each line was built from
    pub nodes: Vec<Option<(NodeId, NodeId)>>,
}

impl LinearizedResult {
    /// Collect the classified components of an integrator built over `lines`
    pub fn from_integrator(
        integrator: &ThicknessIntegrator,
        lines: &[StressClassificationLine],
        field: FieldKind,
    ) -> LinResult<Self> {
        if integrator.n_lines() != lines.len() {
            return Err(LinearizationError::InvalidInput(format!(
                "{} integrated lines for {} stress classification lines",
                integrator.n_lines(),
                lines.len()
            )));
        }

        let membrane = integrator.membrane();
        let bending = integrator.bending();
        let last = integrator.npoints() - 1;
        let principal_profile = integrator.linearized_principal_profile()?;

        let mut result = Self {
            field,
            membrane: Vec::with_capacity(lines.len()),
            bending: Vec::with_capacity(lines.len()),
            peak: Vec::with_capacity(lines.len()),
            principal: Vec::with_capacity(lines.len()),
            triaxiality_factor: Vec::with_capacity(lines.len()),
            location: lines.iter().map(StressClassificationLine::midpoint).collect(),
            nodes: lines.iter().map(|l| l.nodes).collect(),
        };

        for (l, (peak, principal)) in integrator.peak().iter().zip(&principal_profile).enumerate() {
            result.membrane.push(std::array::from_fn(|i| membrane[(l, i)]));
            result.bending.push(std::array::from_fn(|i| bending[(l, i)]));
            result.peak.push([
                std::array::from_fn(|i| peak[(i, 0)]),
                std::array::from_fn(|i| peak[(i, 1)]),
            ]);
            result.principal.push([
                std::array::from_fn(|i| principal[(i, 0)]),
                std::array::from_fn(|i| principal[(i, last)]),
            ]);
            result.triaxiality_factor.push(match field {
                FieldKind::Stress => line_triaxiality(integrator, l)?,
                FieldKind::Strain => None,
            });
        }
        Ok(result)
    }

    pub fn n_lines(&self) -> usize {
        self.membrane.len()
    }

    /// Membrane + bending on the first (`+`) and second (`-`) surface
    pub fn linearized(&self, line: usize) -> [Voigt; 2] {
        let m = &self.membrane[line];
        let b = &self.bending[line];
        [
            std::array::from_fn(|i| m[i] + b[i]),
            std::array::from_fn(|i| m[i] - b[i]),
        ]
    }

    /// Largest equivalent values over all lines
    ///
    /// `eqv` reduces a tensor to its scalar equivalent.
    pub fn maxima(&self, eqv: impl Fn(&Voigt) -> f64) -> LinResult<LinearizedMaxima> {
        if self.n_lines() == 0 {
            return Err(LinearizationError::MissingData(
                "no stress classification lines to reduce".into(),
            ));
        }
        let mut maxima = LinearizedMaxima {
            membrane: f64::NEG_INFINITY,
            bending: f64::NEG_INFINITY,
            linearized: f64::NEG_INFINITY,
        };
        for l in 0..self.n_lines() {
            maxima.membrane = maxima.membrane.max(eqv(&self.membrane[l]));
            maxima.bending = maxima.bending.max(eqv(&self.bending[l]));
            for surface in self.linearized(l) {
                maxima.linearized = maxima.linearized.max(eqv(&surface));
            }
        }
        Ok(maxima)
    }
}

fn line_triaxiality(integrator: &ThicknessIntegrator, line: usize) -> LinResult<Option<f64>> {
    match integrator.line_triaxiality(line) {
        Ok(profile) => Ok(Some(profile.mean())),
        Err(err @ LinearizationError::IndeterminateTriaxiality { .. }) => {
            log::warn!("{err}; reporting no triaxiality factor for this line");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Case-level maxima of one linearized field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearizedMaxima {
    pub membrane: f64,
    pub bending: f64,
    /// Largest of membrane + bending and membrane - bending
    pub linearized: f64,
}

/// Everything persisted for one evaluated case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub stress: LinearizedResult,
    pub strain: LinearizedResult,
    pub summary: CaseSummary,
}

/// One row of the summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub case: String,
    pub parameters: CaseParameters,
    pub stress: LinearizedMaxima,
    pub strain: LinearizedMaxima,
    /// Largest nodal von Mises stress over the evaluated subset
    pub max_eqv_stress: Option<f64>,
    /// Largest nodal equivalent strain over the evaluated subset
    pub max_eqv_strain: Option<f64>,
}

/// Render the summary table; parameter columns follow first appearance
pub fn summary_csv(summaries: &[CaseSummary]) -> String {
    let mut seen = HashSet::new();
    let parameter_names: Vec<&str> = summaries
        .iter()
        .flat_map(|s| s.parameters.names())
        .filter(|n| seen.insert(*n))
        .collect();
    let with_eqv = summaries
        .iter()
        .any(|s| s.max_eqv_stress.is_some() || s.max_eqv_strain.is_some());

    let mut header = vec!["case"];
    header.extend(&parameter_names);
    header.extend([
        "membrane_stress",
        "bending_stress",
        "linearized_stress",
        "membrane_strain",
        "bending_strain",
        "linearized_strain",
    ]);
    if with_eqv {
        header.extend(["max_eqv_stress", "max_eqv_strain"]);
    }

    let mut out = header.join(",");
    out.push('\n');
    for summary in summaries {
        let mut row = vec![summary.case.clone()];
        row.extend(
            parameter_names
                .iter()
                .map(|n| summary.parameters.get(n).map(|v| v.to_string()).unwrap_or_default()),
        );
        for value in [
            summary.stress.membrane,
            summary.stress.bending,
            summary.stress.linearized,
            summary.strain.membrane,
            summary.strain.bending,
            summary.strain.linearized,
        ] {
            row.push(value.to_string());
        }
        if with_eqv {
            for value in [summary.max_eqv_stress, summary.max_eqv_strain] {
                row.push(value.map(|v| v.to_string()).unwrap_or_default());
            }
        }
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write the summary table to `path`
pub fn write_summary_csv(path: impl AsRef<Path>, summaries: &[CaseSummary]) -> LinResult<()> {
    let mut file = BufWriter::new(File::create(path.as_ref())?);
    file.write_all(summary_csv(summaries).as_bytes())?;
    file.flush()?;
    log::info!(
        "wrote {} case summaries to {}",
        summaries.len(),
        path.as_ref().display()
    );
    Ok(())
}
