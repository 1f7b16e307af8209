//! Linear assignment problem (LAP) tracking.
//!
//! Objects detected frame by frame are linked into trajectories in two
//! phases: frame-to-frame linking, then gap closing, merging and splitting
//! between the track segments the first phase produced. Both phases solve a
//! LAP over a cost matrix extended with "no link" alternatives.

pub mod assignment;
pub mod cost;
pub mod shared;
pub mod tracking;
