//! Through-thickness integration of sampled fields
//!
//! Linearization follows the ASME Section VIII Div. 2 / ITER SDC-IC surface
//! rules. For a line of thickness `t` with arc length `x` from the first
//! surface:
//!
//! ```text
//! membrane = 1/t       * ∫ σ(x) dx                 (trapezoidal rule)
//! bending  = 6/t^2     * ∫ σ(x) (t/2 - x) dx       (Simpson's rule)
//! peak     = σ(x) - membrane - bending(x)
//! ```
//!
//! The bending profile is the straight line from `+bending` on the first
//! surface to `-bending` on the second, zero at mid-thickness. Peak values
//! are reported on the two surfaces only.
//!
//! Any field works for membrane, bending and peak; von Mises, principal and
//! triaxiality reductions need the six Voigt components.

use nalgebra::{DMatrix, DVector};

use crate::error::{LinResult, LinearizationError};
use crate::math::{self, quadrature, Voigt, VOIGT_LEN};
use crate::scl::{check_npoints, check_thickness};

/// Field samples along a set of stress classification lines
#[derive(Debug, Clone)]
pub struct ThicknessIntegrator {
    npoints: usize,
    components: usize,
    /// Per line, `components x npoints`
    samples: Vec<DMatrix<f64>>,
    /// Per line, arc length of each point from the first one
    positions: Vec<Vec<f64>>,
    thickness: Vec<f64>,
}

impl ThicknessIntegrator {
    /// # Arguments
    /// * `samples` - `(P * npoints) x V` field values
    /// * `locations` - `(P * npoints) x D` coordinates of the samples
    /// * `npoints` - integration points per line
    pub fn new(samples: &DMatrix<f64>, locations: &DMatrix<f64>, npoints: usize) -> LinResult<Self> {
        check_npoints(npoints)?;
        if samples.nrows() != locations.nrows() {
            return Err(LinearizationError::InvalidInput(format!(
                "cannot integrate on uneven arrays: {} samples, {} locations",
                samples.nrows(),
                locations.nrows()
            )));
        }
        if samples.nrows() % npoints != 0 {
            return Err(LinearizationError::InvalidInput(format!(
                "{} samples do not split into lines of {npoints} points",
                samples.nrows()
            )));
        }

        let n_lines = samples.nrows() / npoints;
        let components = samples.ncols();
        let mut lines = Vec::with_capacity(n_lines);
        let mut positions = Vec::with_capacity(n_lines);
        let mut thickness = Vec::with_capacity(n_lines);

        for l in 0..n_lines {
            let rows = l * npoints..(l + 1) * npoints;
            let xs: Vec<f64> = rows
                .clone()
                .map(|r| row_distance(locations, rows.start, r))
                .collect();
            let t = row_distance(locations, rows.start, rows.end - 1);
            let scale = locations.rows(rows.start, npoints).amax();
            check_thickness(t, scale, &format!("SCL {l}"))?;

            lines.push(samples.rows(rows.start, npoints).transpose());
            positions.push(xs);
            thickness.push(t);
        }

        Ok(Self {
            npoints,
            components,
            samples: lines,
            positions,
            thickness,
        })
    }

    pub fn n_lines(&self) -> usize {
        self.samples.len()
    }

    pub fn npoints(&self) -> usize {
        self.npoints
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn thickness(&self) -> &[f64] {
        &self.thickness
    }

    /// Raw samples of one line, `V x npoints`
    pub fn line(&self, line: usize) -> &DMatrix<f64> {
        &self.samples[line]
    }

    /// Arc-length positions of one line
    pub fn positions(&self, line: usize) -> &[f64] {
        &self.positions[line]
    }

    // ========================
    // Linearized components
    // ========================

    /// Through-thickness average, `P x V`
    pub fn membrane(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_lines(), self.components, |l, c| {
            let row: Vec<f64> = self.samples[l].row(c).iter().copied().collect();
            quadrature::trapezoid(&row, &self.positions[l]) / self.thickness[l]
        })
    }

    /// Alias of [`membrane`](Self::membrane) for scalar fields
    pub fn thickness_average(&self) -> DMatrix<f64> {
        self.membrane()
    }

    /// Membrane value repeated at every point, `V x npoints` per line
    pub fn membrane_profile(&self) -> Vec<DMatrix<f64>> {
        let membrane = self.membrane();
        (0..self.n_lines())
            .map(|l| DMatrix::from_fn(self.components, self.npoints, |c, _| membrane[(l, c)]))
            .collect()
    }

    /// Bending value at the first surface, `P x V`
    pub fn bending(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_lines(), self.components, |l, c| {
            let t = self.thickness[l];
            let xs = &self.positions[l];
            let moment: Vec<f64> = self.samples[l]
                .row(c)
                .iter()
                .zip(xs)
                .map(|(s, x)| s * (0.5 * t - x))
                .collect();
            6.0 / (t * t) * quadrature::simpson(&moment, xs)
        })
    }

    /// Linear bending distribution, `+bending` to `-bending`, `V x npoints`
    /// per line
    pub fn bending_profile(&self) -> Vec<DMatrix<f64>> {
        let bending = self.bending();
        let last = (self.npoints - 1) as f64;
        (0..self.n_lines())
            .map(|l| {
                DMatrix::from_fn(self.components, self.npoints, |c, k| {
                    // integer numerator keeps the profile exactly antisymmetric
                    let weight = (self.npoints as f64 - 1.0 - 2.0 * k as f64) / last;
                    bending[(l, c)] * weight
                })
            })
            .collect()
    }

    /// Membrane plus bending at every point, `V x npoints` per line
    pub fn linearized_profile(&self) -> Vec<DMatrix<f64>> {
        self.membrane_profile()
            .into_iter()
            .zip(self.bending_profile())
            .map(|(m, b)| m + b)
            .collect()
    }

    /// Residual field after removing membrane and bending, `V x npoints`
    /// per line
    pub fn peak_profile(&self) -> Vec<DMatrix<f64>> {
        self.samples
            .iter()
            .zip(self.linearized_profile())
            .map(|(raw, linear)| raw - linear)
            .collect()
    }

    /// Peak values on the two surfaces, `V x 2` per line
    pub fn peak(&self) -> Vec<DMatrix<f64>> {
        let last = self.npoints - 1;
        self.peak_profile()
            .into_iter()
            .map(|p| DMatrix::from_fn(self.components, 2, |c, e| p[(c, if e == 0 { 0 } else { last })]))
            .collect()
    }

    // ========================
    // Scalar reductions
    // ========================

    fn require_tensor(&self) -> LinResult<()> {
        if self.components != VOIGT_LEN {
            return Err(LinearizationError::InvalidInput(format!(
                "stress reductions need {VOIGT_LEN} tensor components, field has {}",
                self.components
            )));
        }
        Ok(())
    }

    /// Principal values of membrane + bending at the first surface, `P x 3`
    pub fn linearized_principal(&self) -> LinResult<DMatrix<f64>> {
        self.require_tensor()?;
        let linear = self.membrane() + self.bending();
        let mut out = DMatrix::zeros(self.n_lines(), 3);
        for l in 0..self.n_lines() {
            let principal = math::principal_stresses(&row_voigt(&linear, l));
            for (i, p) in principal.iter().enumerate() {
                out[(l, i)] = *p;
            }
        }
        Ok(out)
    }

    /// Principal values of the linearized profile, `3 x npoints` per line
    pub fn linearized_principal_profile(&self) -> LinResult<Vec<DMatrix<f64>>> {
        self.require_tensor()?;
        Ok(self
            .linearized_profile()
            .iter()
            .map(|linear| {
                let mut out = DMatrix::zeros(3, self.npoints);
                for k in 0..self.npoints {
                    let principal = math::principal_stresses(&column_voigt(linear, k));
                    for (i, p) in principal.iter().enumerate() {
                        out[(i, k)] = *p;
                    }
                }
                out
            })
            .collect())
    }

    /// von Mises of the membrane tensor, one per line
    pub fn membrane_vm(&self) -> LinResult<DVector<f64>> {
        self.require_tensor()?;
        let membrane = self.membrane();
        Ok(DVector::from_fn(self.n_lines(), |l, _| {
            math::von_mises_full(&row_voigt(&membrane, l))
        }))
    }

    /// von Mises of the bending tensor at the surface, one per line
    pub fn bending_vm(&self) -> LinResult<DVector<f64>> {
        self.require_tensor()?;
        let bending = self.bending();
        Ok(DVector::from_fn(self.n_lines(), |l, _| {
            math::von_mises_full(&row_voigt(&bending, l))
        }))
    }

    /// von Mises of membrane + bending on each surface, `P x 2`
    pub fn linearized_vm(&self) -> LinResult<DMatrix<f64>> {
        self.require_tensor()?;
        let membrane = self.membrane();
        let bending = self.bending();
        Ok(DMatrix::from_fn(self.n_lines(), 2, |l, e| {
            let m = row_voigt(&membrane, l);
            let b = row_voigt(&bending, l);
            let sign = if e == 0 { 1.0 } else { -1.0 };
            let linear: Voigt = std::array::from_fn(|i| m[i] + sign * b[i]);
            math::von_mises_full(&linear)
        }))
    }

    /// von Mises of the peak tensor on each surface, `P x 2`
    pub fn peak_vm(&self) -> LinResult<DMatrix<f64>> {
        self.require_tensor()?;
        let peak = self.peak();
        Ok(DMatrix::from_fn(self.n_lines(), 2, |l, e| {
            math::von_mises_full(&column_voigt(&peak[l], e))
        }))
    }

    /// Triaxiality factor of the raw field at every point, `npoints` per line
    ///
    /// Fails where the stress state is purely hydrostatic.
    pub fn triaxiality_profile(&self) -> LinResult<Vec<DVector<f64>>> {
        self.require_tensor()?;
        (0..self.n_lines()).map(|l| self.line_triaxiality(l)).collect()
    }

    /// Through-thickness mean triaxiality factor, one per line
    pub fn triaxiality_factor(&self) -> LinResult<DVector<f64>> {
        let profile = self.triaxiality_profile()?;
        Ok(DVector::from_iterator(
            profile.len(),
            profile.iter().map(|p| p.mean()),
        ))
    }

    /// Triaxiality profile of one line
    pub fn line_triaxiality(&self, line: usize) -> LinResult<DVector<f64>> {
        self.require_tensor()?;
        let samples = &self.samples[line];
        let mut out = DVector::zeros(self.npoints);
        for k in 0..self.npoints {
            out[k] = math::triaxiality_factor(&column_voigt(samples, k))
                .ok_or(LinearizationError::IndeterminateTriaxiality { line, point: k })?;
        }
        Ok(out)
    }
}

fn row_distance(m: &DMatrix<f64>, a: usize, b: usize) -> f64 {
    m.row(a)
        .iter()
        .zip(m.row(b).iter())
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn row_voigt(m: &DMatrix<f64>, row: usize) -> Voigt {
    std::array::from_fn(|i| m[(row, i)])
}

fn column_voigt(m: &DMatrix<f64>, col: usize) -> Voigt {
    std::array::from_fn(|i| m[(i, col)])
}
