use crate::cost::domain::cost_matrix::CostMatrix;
use crate::cost::domain::sparse_cost_matrix::SparseCostMatrix;

/// Matching between the rows and columns of a cost matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    row_to_col: Vec<Option<usize>>,
    total_cost: f64,
}

impl Assignment {
    pub fn new(row_to_col: Vec<Option<usize>>, total_cost: f64) -> Self {
        Self {
            row_to_col,
            total_cost,
        }
    }

    /// No row matched.
    pub fn empty(rows: usize) -> Self {
        Self::new(vec![None; rows], 0.0)
    }

    pub fn col_for_row(&self, row: usize) -> Option<usize> {
        self.row_to_col.get(row).copied().flatten()
    }

    pub fn row_to_col(&self) -> &[Option<usize>] {
        &self.row_to_col
    }

    /// Matched `(row, col)` pairs by increasing row.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| (row, c)))
    }

    /// Number of matched rows.
    pub fn len(&self) -> usize {
        self.pairs().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the matched entries' costs.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// True when no column is matched to two rows.
    pub fn is_valid_matching(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.pairs().all(|(_, col)| seen.insert(col))
    }
}

/// Solves the linear assignment problem: a minimum-cost matching between
/// rows and columns.
///
/// Dense matrices are treated as complete: every row of a square input is
/// matched, at the blocking cost if nothing else is possible. Callers reject
/// pairs whose cost reaches the blocking value.
///
/// In a sparse matrix only the stored entries can be matched. The result has
/// as many pairs as any matching over stored entries can have, and among
/// those matchings its total cost is minimal. Rows left out are unmatched.
pub trait AssignmentSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, costs: &CostMatrix) -> Assignment;

    fn solve_sparse(&self, costs: &SparseCostMatrix) -> Assignment;
}

/// Sparse solve through a dense completion: cells without an entry cost more
/// than any assignment made of stored entries, so the dense optimum uses as
/// few of them as possible. Pairs landing on such cells are then dropped.
pub fn solve_sparse_by_completion<S>(solver: &S, costs: &SparseCostMatrix) -> Assignment
where
    S: AssignmentSolver + ?Sized,
{
    let missing = 1.0 + costs.costs().iter().map(|c| c.abs()).sum::<f64>() * 2.0;
    let dense = costs.to_dense(missing);
    let mut row_to_col = solver.solve(&dense).row_to_col().to_vec();
    for (row, col) in row_to_col.iter_mut().enumerate() {
        if col.is_some_and(|c| costs.get(row, c).is_none()) {
            *col = None;
        }
    }
    let total = costs.total_assignment_cost(&row_to_col);
    Assignment::new(row_to_col, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_and_len() {
        let assignment = Assignment::new(vec![Some(2), None, Some(0)], 7.0);
        assert_eq!(assignment.pairs().collect::<Vec<_>>(), vec![(0, 2), (2, 0)]);
        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.col_for_row(1), None);
        assert_eq!(assignment.col_for_row(9), None);
        assert!(assignment.is_valid_matching());
    }

    #[test]
    fn test_repeated_column_is_invalid() {
        let assignment = Assignment::new(vec![Some(1), Some(1)], 0.0);
        assert!(!assignment.is_valid_matching());
    }

    #[test]
    fn test_empty() {
        let assignment = Assignment::empty(3);
        assert!(assignment.is_empty());
        assert_eq!(assignment.row_to_col().len(), 3);
    }
}
