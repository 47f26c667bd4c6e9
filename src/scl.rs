//! Stress classification lines between paired surface nodes

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{LinResult, LinearizationError};
use crate::mesh::NodeId;
use crate::pairing::{NodePair, NodePairing};

/// Thickness below this fraction of the coordinate magnitude counts as zero
const DEGENERATE_RELATIVE_TOL: f64 = 1e-12;

/// A straight line through the wall from one surface node to its partner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressClassificationLine {
    pub start: [f64; 3],
    pub end: [f64; 3],
    /// Surface nodes the line was built from, if known
    pub nodes: Option<(NodeId, NodeId)>,
}

impl StressClassificationLine {
    pub fn new(start: [f64; 3], end: [f64; 3]) -> Self {
        Self { start, end, nodes: None }
    }

    pub fn from_pair(pair: &NodePair) -> Self {
        Self {
            start: pair.first.coords(),
            end: pair.second.coords(),
            nodes: Some((pair.first.id, pair.second.id)),
        }
    }

    /// Wall thickness along the line
    pub fn thickness(&self) -> f64 {
        distance(&self.start, &self.end)
    }

    pub fn midpoint(&self) -> [f64; 3] {
        std::array::from_fn(|i| 0.5 * (self.start[i] + self.end[i]))
    }

    fn label(&self) -> String {
        match self.nodes {
            Some((a, b)) => format!("SCL for node pair ({a}, {b})"),
            None => format!("SCL from {:?} to {:?}", self.start, self.end),
        }
    }

    /// Fail on a zero-thickness line
    pub fn validate(&self) -> LinResult<()> {
        let scale = self
            .start
            .iter()
            .chain(&self.end)
            .fold(0.0_f64, |acc, c| acc.max(c.abs()));
        check_thickness(self.thickness(), scale, &self.label())
    }

    /// `npoints` evenly spaced points from `start` to `end`, both included
    /// exactly
    pub fn points(&self, npoints: usize) -> LinResult<Vec<[f64; 3]>> {
        check_npoints(npoints)?;
        let last = (npoints - 1) as f64;
        Ok((0..npoints)
            .map(|k| {
                let t = k as f64 / last;
                std::array::from_fn(|i| (1.0 - t) * self.start[i] + t * self.end[i])
            })
            .collect())
    }

    /// Arc-length position of each of the `npoints` points
    pub fn positions(&self, npoints: usize) -> LinResult<Vec<f64>> {
        check_npoints(npoints)?;
        let thickness = self.thickness();
        let last = (npoints - 1) as f64;
        Ok((0..npoints).map(|k| thickness * k as f64 / last).collect())
    }
}

/// Integration points of many lines, flattened to `(P * npoints) x 3`
/// with the point-along-line index varying fastest
pub fn build_scl_points(lines: &[StressClassificationLine], npoints: usize) -> LinResult<DMatrix<f64>> {
    check_npoints(npoints)?;
    let mut out = DMatrix::zeros(lines.len() * npoints, 3);
    for (l, line) in lines.iter().enumerate() {
        line.validate()?;
        for (k, point) in line.points(npoints)?.iter().enumerate() {
            for (i, &c) in point.iter().enumerate() {
                out[(l * npoints + k, i)] = c;
            }
        }
    }
    Ok(out)
}

/// One line per pair, oriented first set to second set
pub fn lines_from_pairing(pairing: &NodePairing) -> Vec<StressClassificationLine> {
    pairing.iter().map(StressClassificationLine::from_pair).collect()
}

pub(crate) fn check_npoints(npoints: usize) -> LinResult<()> {
    if npoints < 2 {
        return Err(LinearizationError::InvalidInput(format!(
            "a stress classification line needs at least 2 points, got {npoints}"
        )));
    }
    Ok(())
}

pub(crate) fn check_thickness(thickness: f64, scale: f64, label: &str) -> LinResult<()> {
    if !thickness.is_finite() {
        return Err(LinearizationError::InvalidInput(format!(
            "{label} has non-finite thickness"
        )));
    }
    if thickness == 0.0 || thickness <= DEGENERATE_RELATIVE_TOL * scale {
        return Err(LinearizationError::DegenerateGeometry(format!(
            "{label} has zero thickness"
        )));
    }
    Ok(())
}

fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt()
}
