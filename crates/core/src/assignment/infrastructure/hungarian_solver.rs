//! Kuhn-Munkres (Hungarian) algorithm in its O(n³) shortest augmenting path
//! form with row and column potentials.

use ndarray::ArrayView2;

use crate::assignment::domain::assignment_solver::{
    solve_sparse_by_completion, Assignment, AssignmentSolver,
};
use crate::cost::domain::cost_matrix::CostMatrix;
use crate::cost::domain::sparse_cost_matrix::SparseCostMatrix;

/// Reference solver. Rectangular input is padded to square with zero-cost
/// rows or columns; pairs landing in the padding are dropped from the result.
#[derive(Clone, Copy, Debug, Default)]
pub struct HungarianSolver;

impl AssignmentSolver for HungarianSolver {
    fn name(&self) -> &'static str {
        "hungarian"
    }

    fn solve(&self, costs: &CostMatrix) -> Assignment {
        let (rows, cols) = (costs.nrows(), costs.ncols());
        if rows == 0 || cols == 0 {
            return Assignment::empty(rows);
        }
        let square = if costs.is_square() {
            costs.clone()
        } else {
            costs.padded_to_square(PADDING_COST)
        };

        let mut row_to_col = kuhn_munkres(square.view());
        row_to_col.truncate(rows);
        for col in row_to_col.iter_mut() {
            if col.is_some_and(|c| c >= cols) {
                *col = None;
            }
        }
        let total = costs.total_assignment_cost(&row_to_col);
        Assignment::new(row_to_col, total)
    }

    fn solve_sparse(&self, costs: &SparseCostMatrix) -> Assignment {
        solve_sparse_by_completion(self, costs)
    }
}

pub(crate) const PADDING_COST: f64 = 0.0;

/// Minimum-cost perfect matching of a square matrix. A row is left unmatched
/// only if every remaining entry is non-finite.
fn kuhn_munkres(cost: ArrayView2<'_, f64>) -> Vec<Option<usize>> {
    let n = cost.nrows();
    // 1-based; index 0 is the virtual root of each augmenting search.
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        matched_row[0] = i;
        let mut j0 = 0;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        let mut augmented = true;

        loop {
            used[j0] = true;
            let i0 = matched_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if reduced < min_slack[j] {
                    min_slack[j] = reduced;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            if j1 == 0 {
                augmented = false;
                break;
            }
            for j in 0..=n {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if matched_row[j0] == 0 {
                break;
            }
        }

        if !augmented {
            log::warn!("Hungarian solver found no finite entry for row {}", i - 1);
            continue;
        }
        loop {
            let j1 = way[j0];
            matched_row[j0] = matched_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![None; n];
    for j in 1..=n {
        if matched_row[j] != 0 {
            row_to_col[matched_row[j] - 1] = Some(j - 1);
        }
    }
    row_to_col
}
