/// Default maximum distance for frame-to-frame links.
pub const DEFAULT_LINKING_MAX_DISTANCE: f64 = 15.0;

/// Default maximum distance for gap-closing links.
pub const DEFAULT_GAP_CLOSING_MAX_DISTANCE: f64 = 15.0;

/// Default maximum frame gap bridged by gap closing.
pub const DEFAULT_GAP_CLOSING_MAX_FRAME_GAP: usize = 2;

pub const DEFAULT_MERGING_MAX_DISTANCE: f64 = 15.0;
pub const DEFAULT_SPLITTING_MAX_DISTANCE: f64 = 15.0;

pub const DEFAULT_ALLOW_GAP_CLOSING: bool = true;
pub const DEFAULT_ALLOW_TRACK_MERGING: bool = false;
pub const DEFAULT_ALLOW_TRACK_SPLITTING: bool = false;

/// Sentinel cost of forbidden pairs.
///
/// Finite so that sums of a few blocked entries stay finite inside the
/// solvers' potential updates.
pub const DEFAULT_BLOCKING_VALUE: f64 = 1.0e100;

/// Factor applied to the max (or percentile) of realized costs to obtain the
/// cost of not linking.
pub const DEFAULT_ALTERNATIVE_LINKING_COST_FACTOR: f64 = 1.05;

/// Percentile of realized segment-linking costs used for their alternative cost.
pub const DEFAULT_CUTOFF_PERCENTILE: f64 = 0.9;

/// Weight of a feature's normalized difference in the penalty term.
pub const FEATURE_PENALTY_SCALE: f64 = 1.5;

/// Floor substituted for a zero squared distance in feature-penalized costs.
pub const ZERO_DISTANCE_FLOOR: f64 = f64::MIN_POSITIVE;
