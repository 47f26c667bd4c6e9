//! Tensor reductions used to classify linearized stress
//!
//! Symmetric tensors are stored in Voigt order `[xx, yy, zz, xy, yz, xz]`,
//! the column order the solver exports nodal stress and strain in.

pub mod quadrature;

use nalgebra::{Matrix3, SymmetricEigen};

use crate::error::{LinResult, LinearizationError};

pub type Mat3 = Matrix3<f64>;

/// Six independent components of a symmetric 3x3 tensor
pub type Voigt = [f64; 6];

/// Number of independent components of a symmetric tensor
pub const VOIGT_LEN: usize = 6;

/// von Mises stress below this fraction of the stress magnitude is treated as zero
const VM_RELATIVE_TOL: f64 = 1e-12;

/// Expand Voigt components into the full symmetric matrix
///
/// ```text
/// [[xx xy xz]
///  [xy yy yz]
///  [xz yz zz]]
/// ```
pub fn tensor_from_voigt(v: &Voigt) -> Mat3 {
    Mat3::new(
        v[0], v[3], v[5],
        v[3], v[1], v[4],
        v[5], v[4], v[2],
    )
}

/// Collapse a symmetric matrix back to Voigt components
pub fn voigt_from_tensor(m: &Mat3) -> Voigt {
    [m[(0, 0)], m[(1, 1)], m[(2, 2)], m[(0, 1)], m[(1, 2)], m[(0, 2)]]
}

/// Copy a component slice into a Voigt array
pub fn voigt_from_slice(values: &[f64]) -> LinResult<Voigt> {
    values.try_into().map_err(|_| {
        LinearizationError::InvalidInput(format!(
            "a symmetric tensor needs {VOIGT_LEN} components, got {}",
            values.len()
        ))
    })
}

/// Principal values of a symmetric tensor, ascending
pub fn principal_stresses(v: &Voigt) -> [f64; 3] {
    let eigen = SymmetricEigen::new(tensor_from_voigt(v));
    let mut values = [eigen.eigenvalues[0], eigen.eigenvalues[1], eigen.eigenvalues[2]];
    values.sort_by(f64::total_cmp);
    values
}

/// von Mises equivalent of principal (or any three normal) stresses
pub fn von_mises_primary(s: &[f64; 3]) -> f64 {
    (0.5 * ((s[0] - s[1]).powi(2) + (s[1] - s[2]).powi(2) + (s[2] - s[0]).powi(2))).sqrt()
}

/// von Mises equivalent of a full symmetric stress tensor
pub fn von_mises_full(v: &Voigt) -> f64 {
    (0.5 * ((v[0] - v[1]).powi(2)
        + (v[1] - v[2]).powi(2)
        + (v[2] - v[0]).powi(2)
        + 6.0 * (v[3].powi(2) + v[4].powi(2) + v[5].powi(2))))
    .sqrt()
}

/// von Mises equivalent of either a 3-component primary state or a
/// 6-component tensor
pub fn von_mises(components: &[f64]) -> LinResult<f64> {
    match components.len() {
        3 => Ok(von_mises_primary(&[components[0], components[1], components[2]])),
        VOIGT_LEN => Ok(von_mises_full(&voigt_from_slice(components)?)),
        n => Err(LinearizationError::InvalidInput(format!(
            "von Mises needs 3 principal or 6 tensor components, got {n}"
        ))),
    }
}

/// Equivalent strain with engineering shear strains and effective
/// Poisson's ratio `nu`
pub fn von_mises_strain(e: &Voigt, nu: f64) -> f64 {
    let normal = (e[0] - e[1]).powi(2) + (e[1] - e[2]).powi(2) + (e[2] - e[0]).powi(2);
    let shear = e[3].powi(2) + e[4].powi(2) + e[5].powi(2);
    (0.5 * normal + 0.75 * shear).sqrt() / (1.0 + nu)
}

/// Sum of principal stresses over their von Mises equivalent
///
/// Returns `None` for a purely hydrostatic state, where the equivalent
/// stress vanishes and the ratio is undefined.
pub fn triaxiality_factor(v: &Voigt) -> Option<f64> {
    let principal = principal_stresses(v);
    let vm = von_mises_primary(&principal);
    let scale = principal.iter().map(|s| s.abs()).fold(0.0, f64::max);
    if vm <= VM_RELATIVE_TOL * scale || vm == 0.0 {
        return None;
    }
    Some(principal.iter().sum::<f64>() / vm)
}

/// Component-wise sum of two tensors
pub fn add(a: &Voigt, b: &Voigt) -> Voigt {
    std::array::from_fn(|i| a[i] + b[i])
}
