pub mod graph_segment_splitter;
pub mod tracker_logger;
pub mod tracker_settings;
