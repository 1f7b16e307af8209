pub mod config_error;
pub mod constants;
pub mod math;
pub mod spot;
pub mod spot_collection;
pub mod trajectory_graph;
pub mod worker_pool;
