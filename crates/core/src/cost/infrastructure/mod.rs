pub mod dense_cost_matrix_creator;
pub mod frame_link_candidates;
pub mod segment_link_candidates;
pub mod sparse_cost_matrix_creator;
