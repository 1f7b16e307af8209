pub mod frame_to_frame_linker;
pub mod jaqaman_linker;
pub mod segment_linker;
