use serde::{Deserialize, Serialize};

use crate::assignment::domain::assignment_solver::AssignmentSolver;

use super::hungarian_solver::HungarianSolver;
use super::jonker_volgenant_solver::JonkerVolgenantSolver;

/// Assignment algorithm preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Hungarian,
    #[default]
    #[serde(alias = "jv")]
    JonkerVolgenant,
}

/// Creates the solver for `kind`.
pub fn create_solver(kind: SolverKind) -> Box<dyn AssignmentSolver> {
    log::debug!("Using {:?} assignment solver", kind);
    match kind {
        SolverKind::Hungarian => Box::new(HungarianSolver),
        SolverKind::JonkerVolgenant => Box::new(JonkerVolgenantSolver),
    }
}
