pub mod hungarian_solver;
pub mod jonker_volgenant_solver;
pub mod solver_factory;
