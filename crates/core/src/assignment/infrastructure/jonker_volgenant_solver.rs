//! Jonker-Volgenant shortest augmenting path solver over compressed-row
//! matrices (Jonker & Volgenant, 1987; sparse variant after Volgenant, 1996).
//!
//! Column reduction and reduction transfer seed the column potentials `v`,
//! then each still-free row is matched by a Dijkstra search over reduced
//! costs `c(i, j) - v[j] - u[i]`, where `u[i] = c(i, x[i]) - v[x[i]]` for an
//! assigned row.

use crate::assignment::domain::assignment_solver::{
    solve_sparse_by_completion, Assignment, AssignmentSolver,
};
use crate::assignment::infrastructure::hungarian_solver::PADDING_COST;
use crate::cost::domain::cost_matrix::CostMatrix;
use crate::cost::domain::sparse_cost_matrix::SparseCostMatrix;

#[derive(Clone, Copy, Debug, Default)]
pub struct JonkerVolgenantSolver;

impl AssignmentSolver for JonkerVolgenantSolver {
    fn name(&self) -> &'static str {
        "jonker-volgenant"
    }

    /// Every cell of the dense matrix is an entry, so a square input is
    /// always fully matched.
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

        let mut row_to_col = lapjv(&SparseCostMatrix::from_dense(&square));
        row_to_col.truncate(rows);
        for col in row_to_col.iter_mut() {
            if col.is_some_and(|c| c >= cols) {
                *col = None;
            }
        }
        let total = costs.total_assignment_cost(&row_to_col);
        Assignment::new(row_to_col, total)
    }

    /// Augments from the narrower side. If every row there finds a path the
    /// result is optimal as is; otherwise the matrix goes through the dense
    /// completion shared with the other solvers.
    fn solve_sparse(&self, costs: &SparseCostMatrix) -> Assignment {
        let (rows, cols) = (costs.nrows(), costs.ncols());
        let row_to_col = if rows > cols {
            let col_to_row = lapjv(&costs.transpose());
            let mut row_to_col = vec![None; rows];
            for (col, row) in col_to_row.into_iter().enumerate() {
                if let Some(row) = row {
                    row_to_col[row] = Some(col);
                }
            }
            row_to_col
        } else {
            lapjv(costs)
        };

        if row_to_col.iter().flatten().count() < rows.min(cols) {
            log::debug!("LAPJV: {rows}x{cols} sparse matrix has unmatched rows, solving its completion");
            return solve_sparse_by_completion(self, costs);
        }
        let total = costs.total_assignment_cost(&row_to_col);
        Assignment::new(row_to_col, total)
    }
}

/// Solves the LAP restricted to stored entries. Rows for which no augmenting
/// path exists are left unmatched.
///
/// The column reduction and reduction transfer are only valid for square
/// input. Otherwise every row starts free with zero potentials, which keeps
/// the potentials of never-matched columns at zero.
fn lapjv(cm: &SparseCostMatrix) -> Vec<Option<usize>> {
    let n_rows = cm.nrows();
    let n_cols = cm.ncols();
    let mut x: Vec<Option<usize>> = vec![None; n_rows];
    let mut y: Vec<Option<usize>> = vec![None; n_cols];
    let mut v = vec![0.0; n_cols];

    let free_rows = if n_rows == n_cols {
        initialize(cm, &mut x, &mut y, &mut v)
    } else {
        (0..n_rows).collect()
    };
    log::trace!(
        "LAPJV: {} of {} rows free after initialization",
        free_rows.len(),
        n_rows
    );

    // Augmentation.
    let mut d = vec![f64::INFINITY; n_cols];
    let mut pred = vec![0usize; n_cols];
    let mut scanned = vec![false; n_cols];
    let mut reached: Vec<usize> = Vec::new();
    for &free in &free_rows {
        for &j in &reached {
            d[j] = f64::INFINITY;
            scanned[j] = false;
        }
        reached.clear();

        for (j, c) in cm.row(free) {
            d[j] = c - v[j];
            pred[j] = free;
            reached.push(j);
        }

        let mut ready: Vec<usize> = Vec::new();
        let sink = loop {
            let mut best: Option<usize> = None;
            for &j in &reached {
                if scanned[j] {
                    continue;
                }
                best = match best {
                    None => Some(j),
                    Some(b) if d[j] < d[b] || (d[j] == d[b] && y[j].is_none() && y[b].is_some()) => {
                        Some(j)
                    }
                    keep => keep,
                };
            }
            let Some(j) = best else {
                break None;
            };
            let Some(i) = y[j] else {
                break Some(j);
            };
            scanned[j] = true;
            ready.push(j);

            let Some(c_ij) = cm.get(i, j) else {
                continue;
            };
            let base = d[j] - (c_ij - v[j]);
            for (k, c) in cm.row(i) {
                if scanned[k] {
                    continue;
                }
                let h = base + c - v[k];
                if h < d[k] {
                    if d[k].is_infinite() {
                        reached.push(k);
                    }
                    d[k] = h;
                    pred[k] = i;
                }
            }
        };

        let Some(sink) = sink else {
            log::trace!("LAPJV: no augmenting path for row {free}");
            continue;
        };

        let min = d[sink];
        for &j in &ready {
            v[j] += d[j] - min;
        }

        let mut j = sink;
        loop {
            let i = pred[j];
            y[j] = Some(i);
            let previous = x[i].replace(j);
            if i == free {
                break;
            }
            match previous {
                Some(prev) => j = prev,
                None => break,
            }
        }
    }

    x
}

/// Column reduction followed by reduction transfer. Returns the rows left
/// unassigned.
fn initialize(
    cm: &SparseCostMatrix,
    x: &mut [Option<usize>],
    y: &mut [Option<usize>],
    v: &mut [f64],
) -> Vec<usize> {
    let n_rows = cm.nrows();
    let n_cols = cm.ncols();

    // Column reduction, scanning columns from the last.
    let mut col_min = vec![f64::INFINITY; n_cols];
    let mut col_argmin: Vec<Option<usize>> = vec![None; n_cols];
    for i in 0..n_rows {
        for (j, c) in cm.row(i) {
            if c < col_min[j] {
                col_min[j] = c;
                col_argmin[j] = Some(i);
            }
        }
    }
    let mut has_several = vec![false; n_rows];
    for j in (0..n_cols).rev() {
        let Some(i) = col_argmin[j] else {
            continue;
        };
        v[j] = col_min[j];
        if x[i].is_none() {
            x[i] = Some(j);
            y[j] = Some(i);
        } else {
            has_several[i] = true;
        }
    }

    // Reduction transfer.
    let mut free_rows = Vec::new();
    for i in 0..n_rows {
        match x[i] {
            None => free_rows.push(i),
            Some(j1) if !has_several[i] => {
                let min = cm
                    .row(i)
                    .filter(|&(j, _)| j != j1)
                    .map(|(j, c)| c - v[j])
                    .fold(f64::INFINITY, f64::min);
                if min.is_finite() {
                    v[j1] -= min;
                }
            }
            Some(_) => {}
        }
    }
    free_rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::infrastructure::hungarian_solver::HungarianSolver;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    const B: f64 = 1e100;

    fn random_matrix(rng: &mut StdRng, n: usize) -> CostMatrix {
        let data = Array2::from_shape_fn((n, n), |_| rng.gen_range(1.0..=100.0));
        CostMatrix::new(data, B)
    }

    #[test]
    fn test_classic_3x3() {
        let costs = CostMatrix::new(array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]], B);
        let assignment = JonkerVolgenantSolver.solve(&costs);
        assert_eq!(assignment.row_to_col(), &[Some(1), Some(0), Some(2)]);
        assert_relative_eq!(assignment.total_cost(), 5.0);
    }

    #[test]
    fn test_4x4_known_optimum() {
        let costs = CostMatrix::new(
            array![
                [82.0, 83.0, 69.0, 92.0],
                [77.0, 37.0, 49.0, 92.0],
                [11.0, 69.0, 5.0, 86.0],
                [8.0, 9.0, 98.0, 23.0],
            ],
            B,
        );
        let assignment = JonkerVolgenantSolver.solve(&costs);
        assert_relative_eq!(assignment.total_cost(), 140.0);
        assert_eq!(assignment.len(), 4);
    }

    #[test]
    fn test_all_rows_want_the_same_column() {
        let costs = CostMatrix::new(array![[1.0, 10.0, 20.0], [1.0, 30.0, 10.0], [1.0, 5.0, 50.0]], B);
        let assignment = JonkerVolgenantSolver.solve(&costs);
        let reference = HungarianSolver.solve(&costs);
        assert_relative_eq!(assignment.total_cost(), reference.total_cost());
        assert!(assignment.is_valid_matching());
    }

    #[test]
    fn test_rectangular_wide() {
        let costs = CostMatrix::new(array![[5.0, 1.0, 9.0], [2.0, 8.0, 1.5]], B);
        let assignment = JonkerVolgenantSolver.solve(&costs);
        assert_eq!(assignment.row_to_col(), &[Some(1), Some(2)]);
    }

    #[test]
    fn test_sparse_row_without_path_stays_unmatched() {
        // Both rows can only use column 0.
        let costs = SparseCostMatrix::from_triplets(2, 2, vec![(0, 0, 3.0), (1, 0, 1.0), (0, 1, 5.0)]).unwrap();
        let assignment = JonkerVolgenantSolver.solve_sparse(&costs);
        assert_eq!(assignment.row_to_col(), &[Some(1), Some(0)]);
        assert_relative_eq!(assignment.total_cost(), 6.0);

        let starved = SparseCostMatrix::from_triplets(2, 2, vec![(0, 0, 3.0), (1, 0, 1.0)]).unwrap();
        let assignment = JonkerVolgenantSolver.solve_sparse(&starved);
        assert_eq!(assignment.row_to_col(), &[None, Some(0)]);
        assert_relative_eq!(assignment.total_cost(), 1.0);
    }

    #[test]
    fn test_sparse_keeps_the_cheapest_rows_when_some_must_stay_unmatched() {
        let costs = SparseCostMatrix::from_triplets(
            5,
            3,
            vec![(0, 0, 17.0), (0, 1, 13.0), (2, 1, 18.0), (4, 0, 1.0)],
        )
        .unwrap();
        let assignment = JonkerVolgenantSolver.solve_sparse(&costs);
        assert_eq!(assignment.row_to_col(), &[Some(1), None, None, None, Some(0)]);
        assert_relative_eq!(assignment.total_cost(), 14.0);
    }

    #[test]
    fn test_sparse_tall_prefers_the_cheaper_row() {
        let costs = SparseCostMatrix::from_triplets(2, 1, vec![(0, 0, 5.0), (1, 0, 1.0)]).unwrap();
        let assignment = JonkerVolgenantSolver.solve_sparse(&costs);
        assert_eq!(assignment.row_to_col(), &[None, Some(0)]);
    }

    #[test]
    fn test_sparse_matches_hungarian_without_perfect_matching() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..500 {
            let rows = rng.gen_range(1..7);
            let cols = rng.gen_range(1..7);
            let mut triplets = Vec::new();
            for i in 0..rows {
                for j in 0..cols {
                    if rng.gen_bool(0.3) {
                        triplets.push((i, j, rng.gen_range(1..=20) as f64));
                    }
                }
            }
            let costs = SparseCostMatrix::from_triplets(rows, cols, triplets).unwrap();
            let jv = JonkerVolgenantSolver.solve_sparse(&costs);
            let hungarian = HungarianSolver.solve_sparse(&costs);
            for assignment in [&jv, &hungarian] {
                assert!(assignment.is_valid_matching());
                assert!(assignment.pairs().all(|(i, j)| costs.get(i, j).is_some()));
            }
            assert_eq!(jv.len(), hungarian.len());
            assert_relative_eq!(jv.total_cost(), hungarian.total_cost(), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_sparse_empty_row() {
        let costs = SparseCostMatrix::new(vec![2.0], vec![1], &[0, 1], 2).unwrap();
        let assignment = JonkerVolgenantSolver.solve_sparse(&costs);
        assert_eq!(assignment.row_to_col(), &[None, Some(1)]);
    }

    #[rstest]
    #[case(3)]
    #[case(7)]
    #[case(25)]
    #[case(80)]
    #[case(200)]
    fn test_matches_hungarian_on_random_matrices(#[case] n: usize) {
        let mut rng = StdRng::seed_from_u64(n as u64 * 7919);
        for _ in 0..3 {
            let costs = random_matrix(&mut rng, n);
            let jv = JonkerVolgenantSolver.solve(&costs);
            let hungarian = HungarianSolver.solve(&costs);
            assert!(jv.is_valid_matching());
            assert!(hungarian.is_valid_matching());
            assert_eq!(jv.len(), n);
            assert_eq!(hungarian.len(), n);
            assert_relative_eq!(jv.total_cost(), hungarian.total_cost(), max_relative = 1e-5);
        }
    }

    #[test]
    fn test_matches_hungarian_on_integer_ties() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 3..30 {
            let data = Array2::from_shape_fn((n, n), |_| rng.gen_range(1..=5) as f64);
            let costs = CostMatrix::new(data, B);
            let jv = JonkerVolgenantSolver.solve(&costs);
            let hungarian = HungarianSolver.solve(&costs);
            assert_relative_eq!(jv.total_cost(), hungarian.total_cost(), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_sparse_matches_hungarian_sparse() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in [5, 12, 40] {
            let mut triplets = Vec::new();
            for i in 0..n {
                // Keep the diagonal so a perfect matching always exists.
                triplets.push((i, i, rng.gen_range(1.0..=100.0)));
                for j in 0..n {
                    if j != i && rng.gen_bool(0.3) {
                        triplets.push((i, j, rng.gen_range(1.0..=100.0)));
                    }
                }
            }
            let costs = SparseCostMatrix::from_triplets(n, n, triplets).unwrap();
            let jv = JonkerVolgenantSolver.solve_sparse(&costs);
            let hungarian = HungarianSolver.solve_sparse(&costs);
            assert_eq!(jv.len(), n);
            assert_eq!(hungarian.len(), n);
            assert_relative_eq!(jv.total_cost(), hungarian.total_cost(), max_relative = 1e-5);
        }
    }
}
