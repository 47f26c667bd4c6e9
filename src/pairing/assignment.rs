//! Rectangular linear assignment (minimum total cost matching)
//!
//! Shortest augmenting path form of the Hungarian method with row and
//! column potentials. Each row is matched to a distinct column; with more
//! columns than rows the surplus columns stay unassigned. O(n^2 m).

use nalgebra::DMatrix;

use crate::error::{LinResult, LinearizationError};

/// Assign every row of `cost` (n x m, n <= m) to a distinct column,
/// minimizing the summed cost. Returns the column chosen for each row.
pub fn linear_sum_assignment(cost: &DMatrix<f64>) -> LinResult<Vec<usize>> {
    let (n, m) = cost.shape();
    if n > m {
        return Err(LinearizationError::InvalidInput(format!(
            "assignment needs rows <= columns, got {n}x{m}"
        )));
    }
    if cost.iter().any(|c| !c.is_finite()) {
        return Err(LinearizationError::InvalidInput(
            "assignment cost matrix contains non-finite entries".into(),
        ));
    }

    // 1-based bookkeeping; row/column 0 is the virtual start of each search
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; m + 1];
    let mut row_of_col = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        row_of_col[0] = row;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = row_of_col[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let slack = cost[(i0 - 1, j - 1)] - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
                if used[j] {
                    u[row_of_col[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }

            j0 = j1;
            if row_of_col[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            row_of_col[j0] = row_of_col[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=m {
        if row_of_col[j] != 0 {
            assignment[row_of_col[j] - 1] = j - 1;
        }
    }
    Ok(assignment)
}
