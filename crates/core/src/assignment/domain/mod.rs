pub mod assignment_solver;
