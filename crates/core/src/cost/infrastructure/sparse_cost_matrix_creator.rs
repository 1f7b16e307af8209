use crate::cost::domain::link_candidates::{LinkCandidates, LinkingCosts, LinkingError};
use crate::cost::domain::sparse_cost_matrix::SparseCostMatrix;
use crate::shared::worker_pool::WorkerPool;

/// Builds a sparse linking block holding only the allowed pairs.
///
/// Sources and targets without any allowed pair are dropped from the block;
/// they stay unlinked without taking part in the assignment.
pub struct SparseCostMatrixCreator;

impl SparseCostMatrixCreator {
    /// Returns `Ok(None)` when no pair is allowed.
    pub fn create<C: LinkCandidates>(
        &self,
        candidates: &C,
        pool: &WorkerPool,
    ) -> Result<Option<LinkingCosts<SparseCostMatrix>>, LinkingError> {
        let cols = candidates.num_targets();
        let rows = pool.map_indexed(candidates.num_sources(), |row| {
            (0..cols)
                .filter_map(|col| candidates.cost(row, col).map(|cost| (col, cost)))
                .collect::<Vec<_>>()
        })?;

        let mut used = vec![false; cols];
        for &(col, _) in rows.iter().flatten() {
            used[col] = true;
        }
        let mut remap = vec![usize::MAX; cols];
        let mut targets = Vec::new();
        for col in (0..cols).filter(|&c| used[c]) {
            remap[col] = targets.len();
            targets.push(candidates.target_id(col));
        }

        let mut sources = Vec::new();
        let mut costs = Vec::new();
        let mut columns = Vec::new();
        let mut row_counts = Vec::new();
        for (row, entries) in rows.iter().enumerate().filter(|(_, e)| !e.is_empty()) {
            sources.push(candidates.source_id(row));
            row_counts.push(entries.len());
            for &(col, cost) in entries {
                columns.push(remap[col]);
                costs.push(cost);
            }
        }

        let Some(alternative) = candidates.alternative_cost(&costs) else {
            return Ok(None);
        };
        let matrix = SparseCostMatrix::new(costs, columns, &row_counts, targets.len())?;
        log::debug!(
            "Sparse linking block {}x{} with {} entries",
            sources.len(),
            targets.len(),
            matrix.cardinality()
        );

        Ok(Some(LinkingCosts {
            matrix,
            source_alternatives: vec![alternative; sources.len()],
            target_alternatives: vec![alternative; targets.len()],
            sources,
            targets,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::domain::link_candidates::tests_support::TableCandidates;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn test_rows_and_columns_without_candidates_are_dropped(#[case] threads: usize) {
        let candidates = TableCandidates::new(vec![
            vec![None, None, Some(2.0)],
            vec![None, None, None],
            vec![Some(1.0), None, Some(5.0)],
        ]);
        let costs = SparseCostMatrixCreator
            .create(&candidates, &WorkerPool::new(threads))
            .unwrap()
            .unwrap();
        assert_eq!(costs.source_list(), &[100, 102]);
        assert_eq!(costs.target_list(), &[200, 202]);
        assert_eq!(costs.matrix.nrows(), 2);
        assert_eq!(costs.matrix.ncols(), 2);
        assert_eq!(costs.matrix.get(0, 1), Some(2.0));
        assert_eq!(costs.matrix.get(0, 0), None);
        assert_eq!(costs.matrix.get(1, 0), Some(1.0));
        assert_eq!(costs.matrix.get(1, 1), Some(5.0));
        assert_eq!(costs.alternative_cost_for_source(0), 5.0);
    }

    #[test]
    fn test_no_candidates_gives_none() {
        let candidates = TableCandidates::new(vec![vec![None], vec![None]]);
        let costs = SparseCostMatrixCreator
            .create(&candidates, &WorkerPool::single_threaded())
            .unwrap();
        assert!(costs.is_none());
    }
}
