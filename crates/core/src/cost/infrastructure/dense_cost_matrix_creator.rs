use ndarray::Array2;

use crate::cost::domain::cost_matrix::CostMatrix;
use crate::cost::domain::link_candidates::{LinkCandidates, LinkingCosts, LinkingError};
use crate::shared::worker_pool::WorkerPool;

/// Builds the full `m × n` linking block, blocked pairs included.
pub struct DenseCostMatrixCreator {
    blocking_value: f64,
}

impl DenseCostMatrixCreator {
    pub fn new(blocking_value: f64) -> Self {
        Self { blocking_value }
    }

    /// Populates the matrix row by row on `pool`. Returns `Ok(None)` when the
    /// problem has no allowed pair, since there is then nothing to solve.
    pub fn create<C: LinkCandidates>(
        &self,
        candidates: &C,
        pool: &WorkerPool,
    ) -> Result<Option<LinkingCosts<CostMatrix>>, LinkingError> {
        let rows = candidates.num_sources();
        let cols = candidates.num_targets();
        if rows == 0 || cols == 0 {
            return Ok(None);
        }

        let blocking = self.blocking_value;
        let mut data = vec![blocking; rows * cols];
        pool.for_each_pulled(data.chunks_mut(cols).enumerate(), |(row, cells)| {
            for (col, cell) in cells.iter_mut().enumerate() {
                if let Some(cost) = candidates.cost(row, col) {
                    *cell = cost.min(blocking);
                }
            }
        })?;

        let realized: Vec<f64> = data.iter().copied().filter(|&c| c < blocking).collect();
        let Some(alternative) = candidates.alternative_cost(&realized) else {
            return Ok(None);
        };

        let costs = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| LinkingError::Shape(e.to_string()))?;

        Ok(Some(LinkingCosts {
            matrix: CostMatrix::new(costs, blocking),
            sources: (0..rows).map(|i| candidates.source_id(i)).collect(),
            targets: (0..cols).map(|j| candidates.target_id(j)).collect(),
            source_alternatives: vec![alternative; rows],
            target_alternatives: vec![alternative; cols],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::domain::link_candidates::tests_support::TableCandidates;
    use rstest::rstest;

    const B: f64 = 1e100;

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn test_blocked_pairs_get_blocking_value(#[case] threads: usize) {
        let candidates = TableCandidates::new(vec![
            vec![Some(1.0), None, Some(3.0)],
            vec![None, Some(2.0), None],
        ]);
        let costs = DenseCostMatrixCreator::new(B)
            .create(&candidates, &WorkerPool::new(threads))
            .unwrap()
            .unwrap();
        assert_eq!(costs.matrix.nrows(), 2);
        assert_eq!(costs.matrix.ncols(), 3);
        assert_eq!(costs.matrix.get(0, 2), 3.0);
        assert_eq!(costs.matrix.get(1, 0), B);
        assert_eq!(costs.source_list(), &[100, 101]);
        assert_eq!(costs.target_list(), &[200, 201, 202]);
        // max policy with factor 1.0
        assert_eq!(costs.alternative_cost_for_source(1), 3.0);
        assert_eq!(costs.alternative_cost_for_target(2), 3.0);
    }

    #[test]
    fn test_all_blocked_gives_none() {
        let candidates = TableCandidates::new(vec![vec![None, None], vec![None, None]]);
        let costs = DenseCostMatrixCreator::new(B)
            .create(&candidates, &WorkerPool::single_threaded())
            .unwrap();
        assert!(costs.is_none());
    }

    #[test]
    fn test_empty_side_gives_none() {
        let candidates = TableCandidates::new(vec![]);
        let costs = DenseCostMatrixCreator::new(B)
            .create(&candidates, &WorkerPool::single_threaded())
            .unwrap();
        assert!(costs.is_none());
    }
}
