//! Dense cost matrix and the helpers that assemble the no-linking complement
//! of Jaqaman et al. (2008), Fig. 1b.

use ndarray::{s, Array2, ArrayView2};

/// Dense rectangular cost matrix. Entries at or above the blocking value are
/// forbidden pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    costs: Array2<f64>,
    blocking_value: f64,
}

impl CostMatrix {
    pub fn new(costs: Array2<f64>, blocking_value: f64) -> Self {
        Self {
            costs,
            blocking_value,
        }
    }

    /// A `rows × cols` matrix in which every pair is blocked.
    pub fn blocked(rows: usize, cols: usize, blocking_value: f64) -> Self {
        Self::new(Array2::from_elem((rows, cols), blocking_value), blocking_value)
    }

    pub fn nrows(&self) -> usize {
        self.costs.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.costs.ncols()
    }

    pub fn is_square(&self) -> bool {
        self.nrows() == self.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[[row, col]]
    }

    pub fn set(&mut self, row: usize, col: usize, cost: f64) {
        self.costs[[row, col]] = cost;
    }

    pub fn blocking_value(&self) -> f64 {
        self.blocking_value
    }

    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        self.get(row, col) >= self.blocking_value
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.costs.view()
    }

    /// Entries strictly below the blocking value, in row-major order.
    pub fn realized_costs(&self) -> Vec<f64> {
        self.costs
            .iter()
            .copied()
            .filter(|&c| c < self.blocking_value)
            .collect()
    }

    /// Square copy, padded with rows or columns of `fill`.
    ///
    /// A constant padding adds the same amount to every complete assignment,
    /// so it does not change which real pairs are optimal.
    pub fn padded_to_square(&self, fill: f64) -> CostMatrix {
        let n = self.nrows().max(self.ncols());
        let mut padded = Array2::from_elem((n, n), fill);
        padded
            .slice_mut(s![..self.nrows(), ..self.ncols()])
            .assign(&self.costs);
        CostMatrix::new(padded, self.blocking_value)
    }

    /// Sum of the entries selected by `row_to_col`.
    pub fn total_assignment_cost(&self, row_to_col: &[Option<usize>]) -> f64 {
        row_to_col
            .iter()
            .enumerate()
            .filter_map(|(i, col)| col.map(|j| self.get(i, j)))
            .sum()
    }
}

/// Square matrix holding `alternatives` on the diagonal and `blocking_value`
/// everywhere else.
pub fn alternative_scores_diagonal(alternatives: &[f64], blocking_value: f64) -> Array2<f64> {
    let n = alternatives.len();
    let mut diagonal = Array2::from_elem((n, n), blocking_value);
    for (i, &alt) in alternatives.iter().enumerate() {
        diagonal[[i, i]] = alt;
    }
    diagonal
}

/// Transpose of `top_left` in which every allowed entry is replaced by `fill`.
/// Blocked entries stay blocked.
pub fn lower_right_transpose(top_left: &CostMatrix, fill: f64) -> Array2<f64> {
    let blocking = top_left.blocking_value();
    top_left
        .view()
        .t()
        .mapv(|c| if c < blocking { fill } else { blocking })
}

/// Extends the `m × n` linking block into the `(m + n) × (n + m)` matrix whose
/// extra rows and columns model "target appears from nothing" and "source
/// links to nothing".
pub fn jaqaman_complement(
    top_left: &CostMatrix,
    source_alternatives: &[f64],
    target_alternatives: &[f64],
) -> CostMatrix {
    let m = top_left.nrows();
    let n = top_left.ncols();
    let blocking = top_left.blocking_value();
    let min_alternative = source_alternatives
        .iter()
        .chain(target_alternatives)
        .copied()
        .fold(blocking, f64::min);

    let mut full = Array2::from_elem((m + n, n + m), blocking);
    full.slice_mut(s![..m, ..n]).assign(&top_left.view());
    full.slice_mut(s![..m, n..])
        .assign(&alternative_scores_diagonal(source_alternatives, blocking));
    full.slice_mut(s![m.., ..n])
        .assign(&alternative_scores_diagonal(target_alternatives, blocking));
    full.slice_mut(s![m.., n..])
        .assign(&lower_right_transpose(top_left, min_alternative));
    CostMatrix::new(full, blocking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const B: f64 = 1e100;

    #[test]
    fn test_realized_costs_skip_blocked() {
        let matrix = CostMatrix::new(array![[1.0, B], [B, 4.0]], B);
        assert_eq!(matrix.realized_costs(), vec![1.0, 4.0]);
        assert!(matrix.is_blocked(0, 1));
        assert!(!matrix.is_blocked(1, 1));
    }

    #[test]
    fn test_padded_to_square() {
        let matrix = CostMatrix::new(array![[1.0, 2.0, 3.0]], B);
        let padded = matrix.padded_to_square(0.0);
        assert!(padded.is_square());
        assert_eq!(padded.nrows(), 3);
        assert_eq!(padded.get(0, 2), 3.0);
        assert_eq!(padded.get(2, 0), 0.0);
    }

    #[test]
    fn test_alternative_scores_diagonal() {
        let diagonal = alternative_scores_diagonal(&[5.0, 6.0], B);
        assert_eq!(diagonal, array![[5.0, B], [B, 6.0]]);
    }

    #[test]
    fn test_lower_right_transpose_keeps_blocked() {
        let top_left = CostMatrix::new(array![[1.0, B, 3.0], [B, 2.0, B]], B);
        let lower_right = lower_right_transpose(&top_left, 0.5);
        assert_eq!(lower_right, array![[0.5, B], [B, 0.5], [0.5, B]]);
    }

    #[test]
    fn test_jaqaman_complement_layout() {
        let top_left = CostMatrix::new(array![[1.0, 4.0, B]], B);
        let full = jaqaman_complement(&top_left, &[4.2], &[4.2, 4.2, 4.2]);
        assert_eq!(full.nrows(), 4);
        assert_eq!(full.ncols(), 4);
        let expected = array![
            [1.0, 4.0, B, 4.2],
            [4.2, B, B, 4.2],
            [B, 4.2, B, 4.2],
            [B, B, 4.2, B],
        ];
        assert_eq!(full.view(), expected.view());
    }

    #[test]
    fn test_total_assignment_cost() {
        let matrix = CostMatrix::new(array![[1.0, 2.0], [3.0, 4.0]], B);
        assert_eq!(matrix.total_assignment_cost(&[Some(1), Some(0)]), 5.0);
        assert_eq!(matrix.total_assignment_cost(&[None, Some(1)]), 4.0);
    }
}
