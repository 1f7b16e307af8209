use thiserror::Error;

use crate::shared::spot::SpotId;
use crate::shared::worker_pool::WorkerPanicked;

use super::sparse_cost_matrix::SparseMatrixError;

/// A linking problem between an ordered source list and an ordered target
/// list.
///
/// Rows are independent: `cost(row, _)` never depends on another row, which
/// lets cost matrix creators compute rows on separate workers.
pub trait LinkCandidates: Sync {
    fn num_sources(&self) -> usize;

    fn num_targets(&self) -> usize;

    fn source_id(&self, row: usize) -> SpotId;

    fn target_id(&self, col: usize) -> SpotId;

    /// Cost of linking source `row` to target `col`, or `None` when the pair
    /// is forbidden.
    fn cost(&self, row: usize, col: usize) -> Option<f64>;

    /// Cost of not linking, given every cost realized in this problem.
    fn alternative_cost(&self, realized: &[f64]) -> Option<f64>;
}

/// A populated linking block with the ids its rows and columns stand for.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkingCosts<M> {
    pub matrix: M,
    pub sources: Vec<SpotId>,
    pub targets: Vec<SpotId>,
    pub source_alternatives: Vec<f64>,
    pub target_alternatives: Vec<f64>,
}

impl<M> LinkingCosts<M> {
    pub fn source_list(&self) -> &[SpotId] {
        &self.sources
    }

    pub fn target_list(&self) -> &[SpotId] {
        &self.targets
    }

    pub fn alternative_cost_for_source(&self, row: usize) -> f64 {
        self.source_alternatives[row]
    }

    pub fn alternative_cost_for_target(&self, col: usize) -> f64 {
        self.target_alternatives[col]
    }
}

/// Failure while building or solving one linking problem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkingError {
    #[error("sparse matrix error: {0}")]
    Matrix(#[from] SparseMatrixError),

    #[error("invalid matrix shape: {0}")]
    Shape(String),

    #[error(transparent)]
    Worker(#[from] WorkerPanicked),
}
