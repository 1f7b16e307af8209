pub mod domain;
pub mod infrastructure;
pub mod lap_tracker;
