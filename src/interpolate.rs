//! Nearest-neighbour interpolation of scattered nodal values
//!
//! Each query takes the value of the closest source point. Distances tie
//! toward the lower source index, so a duplicated coordinate resolves to its
//! first occurrence. Queries outside the hull of the sources extrapolate
//! naturally.
//!
//! Lookups go through an implicit k-d tree over the source points.

use nalgebra::DMatrix;

use crate::error::{LinResult, LinearizationError};

/// Nearest-neighbour interpolator over `M` points in `D` dimensions
#[derive(Debug, Clone)]
pub struct NearestInterpolator {
    dim: usize,
    /// Row-major point coordinates, `M * D`
    coords: Vec<f64>,
    values: DMatrix<f64>,
    /// Point indices arranged as an implicit k-d tree
    tree: Vec<usize>,
}

impl NearestInterpolator {
    /// # Arguments
    /// * `points` - `M x D` source coordinates
    /// * `values` - `M x V` field values at the source points
    pub fn new(points: &DMatrix<f64>, values: DMatrix<f64>) -> LinResult<Self> {
        let (m, dim) = points.shape();
        if m == 0 || dim == 0 {
            return Err(LinearizationError::InvalidInput(
                "interpolation needs at least one source point".into(),
            ));
        }
        if values.nrows() != m {
            return Err(LinearizationError::InvalidInput(format!(
                "{m} source points but {} value rows",
                values.nrows()
            )));
        }
        if points.iter().any(|c| !c.is_finite()) {
            return Err(LinearizationError::InvalidInput(
                "source coordinates must be finite".into(),
            ));
        }

        let mut coords = Vec::with_capacity(m * dim);
        for i in 0..m {
            coords.extend(points.row(i).iter());
        }

        let mut interpolator = Self {
            dim,
            coords,
            values,
            tree: (0..m).collect(),
        };
        interpolator.build(0, m, 0);
        Ok(interpolator)
    }

    pub fn n_points(&self) -> usize {
        self.tree.len()
    }

    pub fn n_components(&self) -> usize {
        self.values.ncols()
    }

    fn point(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dim..(i + 1) * self.dim]
    }

    fn build(&mut self, lo: usize, hi: usize, depth: usize) {
        if hi - lo <= 1 {
            return;
        }
        let axis = depth % self.dim;
        let mid = (lo + hi) / 2;
        let (dim, coords) = (self.dim, &self.coords);
        self.tree[lo..hi].select_nth_unstable_by(mid - lo, |&a, &b| {
            coords[a * dim + axis]
                .total_cmp(&coords[b * dim + axis])
                .then(a.cmp(&b))
        });
        self.build(lo, mid, depth + 1);
        self.build(mid + 1, hi, depth + 1);
    }

    /// Index of the source point closest to `query`, `None` when the query
    /// has the wrong dimension or a non-finite coordinate
    pub fn nearest_index(&self, query: &[f64]) -> Option<usize> {
        if query.len() != self.dim || query.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let mut best = (f64::INFINITY, usize::MAX);
        self.search(query, 0, self.tree.len(), 0, &mut best);
        (best.1 < self.tree.len()).then_some(best.1)
    }

    fn search(&self, query: &[f64], lo: usize, hi: usize, depth: usize, best: &mut (f64, usize)) {
        if lo >= hi {
            return;
        }
        let mid = (lo + hi) / 2;
        let index = self.tree[mid];
        let point = self.point(index);

        let d2: f64 = point.iter().zip(query).map(|(p, q)| (p - q).powi(2)).sum();
        if d2 < best.0 || (d2 == best.0 && index < best.1) {
            *best = (d2, index);
        }

        let axis = depth % self.dim;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff <= 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };
        self.search(query, near.0, near.1, depth + 1, best);
        if diff * diff <= best.0 {
            self.search(query, far.0, far.1, depth + 1, best);
        }
    }

    /// Values at each row of `queries` (`Q x D`), returned as `Q x V`
    pub fn interpolate(&self, queries: &DMatrix<f64>) -> LinResult<DMatrix<f64>> {
        if queries.ncols() != self.dim {
            return Err(LinearizationError::InvalidInput(format!(
                "query points have {} coordinates, sources have {}",
                queries.ncols(),
                self.dim
            )));
        }

        let mut out = DMatrix::zeros(queries.nrows(), self.values.ncols());
        let mut query = vec![0.0; self.dim];
        for q in 0..queries.nrows() {
            for (slot, c) in query.iter_mut().zip(queries.row(q).iter()) {
                *slot = *c;
            }
            let nearest = self.nearest_index(&query).ok_or_else(|| {
                LinearizationError::InvalidInput(format!(
                    "query point {q} has non-finite coordinates {query:?}"
                ))
            })?;
            out.row_mut(q).copy_from(&self.values.row(nearest));
        }
        Ok(out)
    }
}

/// One-shot nearest-neighbour interpolation
pub fn interpolate_nodal_values(
    points: &DMatrix<f64>,
    values: DMatrix<f64>,
    queries: &DMatrix<f64>,
) -> LinResult<DMatrix<f64>> {
    NearestInterpolator::new(points, values)?.interpolate(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &DMatrix<f64>, q: &[f64]) -> usize {
        let mut best = (f64::INFINITY, 0);
        for i in 0..points.nrows() {
            let d: f64 = points.row(i).iter().zip(q).map(|(p, q)| (p - q).powi(2)).sum();
            if d < best.0 {
                best = (d, i);
            }
        }
        best.1
    }

    #[test]
    fn test_values_follow_nearest_point() {
        let points = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let values = DMatrix::from_row_slice(3, 1, &[10.0, 20.0, 30.0]);
        let queries = DMatrix::from_row_slice(3, 2, &[0.1, 0.1, 0.9, -0.2, -5.0, 8.0]);
        let out = interpolate_nodal_values(&points, values, &queries).unwrap();
        assert_eq!(out.as_slice(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_duplicate_points_use_first_occurrence() {
        let points = DMatrix::from_row_slice(3, 3, &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let values = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let interp = NearestInterpolator::new(&points, values).unwrap();
        assert_eq!(interp.nearest_index(&[1.1, 1.0, 1.0]), Some(0));
    }

    #[test]
    fn test_tree_matches_brute_force() {
        // deterministic scatter on a skewed lattice
        let n = 200;
        let mut data = Vec::with_capacity(n * 3);
        for i in 0..n {
            let t = i as f64;
            data.extend([(t * 0.37).sin() * 5.0, (t * 0.11).cos() * 3.0, (t * 0.05) % 2.0]);
        }
        let points = DMatrix::from_row_slice(n, 3, &data);
        let values = DMatrix::from_fn(n, 1, |i, _| i as f64);
        let interp = NearestInterpolator::new(&points, values).unwrap();

        for k in 0..50 {
            let t = k as f64 * 0.7;
            let q = [t.cos() * 4.0, t.sin() * 2.5, (t * 0.3) % 2.0];
            assert_eq!(interp.nearest_index(&q), Some(brute_force(&points, &q)));
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let points = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 1.0]);
        let values = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        assert!(NearestInterpolator::new(&points, values).is_err());
    }

    #[test]
    fn test_non_finite_query_is_rejected() {
        let points = DMatrix::from_row_slice(2, 3, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let values = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        let interp = NearestInterpolator::new(&points, values).unwrap();
        assert_eq!(interp.nearest_index(&[f64::NAN, 0.0, 0.0]), None);
        assert_eq!(interp.nearest_index(&[f64::INFINITY, 0.0, 0.0]), None);
        assert_eq!(interp.nearest_index(&[0.0, 0.0]), None);

        let queries = DMatrix::from_row_slice(2, 3, &[0.9, 0.0, 0.0, f64::NAN, 0.0, 0.0]);
        match interp.interpolate(&queries) {
            Err(LinearizationError::InvalidInput(msg)) => assert!(msg.starts_with("query point 1 ")),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }
}
