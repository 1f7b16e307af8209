pub mod alternative_cost;
pub mod cost_function;
pub mod cost_matrix;
pub mod link_candidates;
pub mod sparse_cost_matrix;
