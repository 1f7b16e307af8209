use crate::assignment::domain::assignment_solver::AssignmentSolver;
use crate::cost::domain::cost_matrix::jaqaman_complement;
use crate::cost::domain::link_candidates::{LinkCandidates, LinkingError};
use crate::cost::infrastructure::dense_cost_matrix_creator::DenseCostMatrixCreator;
use crate::cost::infrastructure::sparse_cost_matrix_creator::SparseCostMatrixCreator;
use crate::shared::spot::SpotId;
use crate::shared::worker_pool::WorkerPool;
use crate::tracking::domain::tracker_settings::MatrixKind;

/// One accepted link between a source and a target object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub source: SpotId,
    pub target: SpotId,
    pub cost: f64,
}

/// Solves one linking problem with the no-linking complement.
///
/// The `m × n` linking block is extended with "link to nothing" rows and
/// columns, the assignment is solved, and every pair landing in the linking
/// block with a cost below the blocking value becomes a link.
pub struct JaqamanLinker<'s> {
    matrix_kind: MatrixKind,
    solver: &'s dyn AssignmentSolver,
    blocking_value: f64,
}

impl<'s> JaqamanLinker<'s> {
    pub fn new(matrix_kind: MatrixKind, solver: &'s dyn AssignmentSolver, blocking_value: f64) -> Self {
        Self {
            matrix_kind,
            solver,
            blocking_value,
        }
    }

    /// Links ordered by source then target id. Empty when the problem has no
    /// allowed pair.
    pub fn link<C: LinkCandidates>(
        &self,
        candidates: &C,
        pool: &WorkerPool,
    ) -> Result<Vec<Link>, LinkingError> {
        let mut links = match self.matrix_kind {
            MatrixKind::Dense => self.link_dense(candidates, pool)?,
            MatrixKind::Sparse => self.link_sparse(candidates, pool)?,
        };
        links.sort_by_key(|l| (l.source, l.target));
        Ok(links)
    }

    fn link_dense<C: LinkCandidates>(
        &self,
        candidates: &C,
        pool: &WorkerPool,
    ) -> Result<Vec<Link>, LinkingError> {
        let Some(block) = DenseCostMatrixCreator::new(self.blocking_value).create(candidates, pool)?
        else {
            return Ok(Vec::new());
        };
        let (m, n) = (block.sources.len(), block.targets.len());
        let full = jaqaman_complement(
            &block.matrix,
            &block.source_alternatives,
            &block.target_alternatives,
        );
        let assignment = self.solver.solve(&full);

        Ok(assignment
            .pairs()
            .filter(|&(i, j)| i < m && j < n)
            .map(|(i, j)| (i, j, full.get(i, j)))
            .filter(|&(_, _, cost)| cost < self.blocking_value)
            .map(|(i, j, cost)| Link {
                source: block.sources[i],
                target: block.targets[j],
                cost,
            })
            .collect())
    }

    fn link_sparse<C: LinkCandidates>(
        &self,
        candidates: &C,
        pool: &WorkerPool,
    ) -> Result<Vec<Link>, LinkingError> {
        let Some(block) = SparseCostMatrixCreator.create(candidates, pool)? else {
            return Ok(Vec::new());
        };
        let (m, n) = (block.sources.len(), block.targets.len());
        let full = block
            .matrix
            .complement(&block.source_alternatives, &block.target_alternatives)?;
        let assignment = self.solver.solve_sparse(&full);

        Ok(assignment
            .pairs()
            .filter(|&(i, j)| i < m && j < n)
            .filter_map(|(i, j)| full.get(i, j).map(|cost| (i, j, cost)))
            .filter(|&(_, _, cost)| cost < self.blocking_value)
            .map(|(i, j, cost)| Link {
                source: block.sources[i],
                target: block.targets[j],
                cost,
            })
            .collect())
    }
}
