use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assignment::infrastructure::solver_factory::SolverKind;
use crate::cost::domain::alternative_cost::AlternativeCost;
use crate::cost::domain::cost_function::CostFunction;
use crate::shared::config_error::{require_positive, ConfigError};
use crate::shared::constants::*;
use crate::shared::worker_pool::available_parallelism;

/// Cost matrix representation used by both tracking phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    /// Full matrix; forbidden pairs hold the blocking value.
    Dense,
    /// Only allowed pairs are stored.
    #[default]
    Sparse,
}

/// Configuration of one LAP tracking run.
///
/// When deserialized, every distance, flag and cost parameter is required;
/// only the feature penalty maps, the thread count, the matrix kind and the
/// solver fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerSettings {
    pub linking_max_distance: f64,
    #[serde(default)]
    pub linking_feature_penalties: BTreeMap<String, f64>,

    pub allow_gap_closing: bool,
    pub gap_closing_max_distance: f64,
    pub gap_closing_max_frame_gap: usize,
    #[serde(default)]
    pub gap_closing_feature_penalties: BTreeMap<String, f64>,

    pub allow_track_merging: bool,
    pub merging_max_distance: f64,
    #[serde(default)]
    pub merging_feature_penalties: BTreeMap<String, f64>,

    pub allow_track_splitting: bool,
    pub splitting_max_distance: f64,
    #[serde(default)]
    pub splitting_feature_penalties: BTreeMap<String, f64>,

    pub blocking_value: f64,
    pub alternative_linking_cost_factor: f64,
    pub cutoff_percentile: f64,

    #[serde(default = "available_parallelism")]
    pub num_threads: usize,
    #[serde(default)]
    pub matrix_kind: MatrixKind,
    #[serde(default)]
    pub solver: SolverKind,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            linking_max_distance: DEFAULT_LINKING_MAX_DISTANCE,
            linking_feature_penalties: BTreeMap::new(),
            allow_gap_closing: DEFAULT_ALLOW_GAP_CLOSING,
            gap_closing_max_distance: DEFAULT_GAP_CLOSING_MAX_DISTANCE,
            gap_closing_max_frame_gap: DEFAULT_GAP_CLOSING_MAX_FRAME_GAP,
            gap_closing_feature_penalties: BTreeMap::new(),
            allow_track_merging: DEFAULT_ALLOW_TRACK_MERGING,
            merging_max_distance: DEFAULT_MERGING_MAX_DISTANCE,
            merging_feature_penalties: BTreeMap::new(),
            allow_track_splitting: DEFAULT_ALLOW_TRACK_SPLITTING,
            splitting_max_distance: DEFAULT_SPLITTING_MAX_DISTANCE,
            splitting_feature_penalties: BTreeMap::new(),
            blocking_value: DEFAULT_BLOCKING_VALUE,
            alternative_linking_cost_factor: DEFAULT_ALTERNATIVE_LINKING_COST_FACTOR,
            cutoff_percentile: DEFAULT_CUTOFF_PERCENTILE,
            num_threads: available_parallelism(),
            matrix_kind: MatrixKind::default(),
            solver: SolverKind::default(),
        }
    }
}

impl TrackerSettings {
    /// Parses settings from JSON and validates them.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every numeric range. Called before any run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("linking_max_distance", self.linking_max_distance)?;
        require_positive("gap_closing_max_distance", self.gap_closing_max_distance)?;
        require_positive("merging_max_distance", self.merging_max_distance)?;
        require_positive("splitting_max_distance", self.splitting_max_distance)?;
        require_positive("blocking_value", self.blocking_value)?;
        self.linking_alternative()?;
        self.segment_alternative()?;
        if self.num_threads == 0 {
            return Err(ConfigError::invalid("num_threads", "expected at least 1 thread"));
        }

        for (key, penalties) in [
            ("linking_feature_penalties", &self.linking_feature_penalties),
            ("gap_closing_feature_penalties", &self.gap_closing_feature_penalties),
            ("merging_feature_penalties", &self.merging_feature_penalties),
            ("splitting_feature_penalties", &self.splitting_feature_penalties),
        ] {
            if let Some((feature, weight)) = penalties
                .iter()
                .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
            {
                return Err(ConfigError::invalid(
                    key,
                    format!("weight of feature '{feature}' must be finite and >= 0, got {weight}"),
                ));
            }
        }

        let largest_distance = [
            self.linking_max_distance,
            self.gap_closing_max_distance,
            self.merging_max_distance,
            self.splitting_max_distance,
        ]
        .into_iter()
        .fold(0.0, f64::max);
        if self.blocking_value <= largest_distance * largest_distance {
            return Err(ConfigError::invalid(
                "blocking_value",
                format!(
                    "must exceed every allowed linking cost, got {} for a max distance of {largest_distance}",
                    self.blocking_value
                ),
            ));
        }
        Ok(())
    }

    /// True when the segment linking phase has anything to do.
    pub fn links_segments(&self) -> bool {
        self.allow_gap_closing || self.allow_track_merging || self.allow_track_splitting
    }

    /// Alternative cost policy of frame-to-frame linking.
    pub fn linking_alternative(&self) -> Result<AlternativeCost, ConfigError> {
        AlternativeCost::max(self.alternative_linking_cost_factor)
    }

    /// Alternative cost policy of gap closing, merging and splitting.
    pub fn segment_alternative(&self) -> Result<AlternativeCost, ConfigError> {
        AlternativeCost::percentile(self.alternative_linking_cost_factor, self.cutoff_percentile)
    }

    pub fn linking_cost_function(&self) -> Result<CostFunction, ConfigError> {
        Ok(CostFunction::from_penalties(
            &self.linking_feature_penalties,
            self.linking_alternative()?,
        ))
    }

    /// Human-readable summary, one setting per line.
    pub fn echo(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Linking conditions:".to_string());
        lines.push(format!("  - max distance: {:.1}", self.linking_max_distance));
        lines.push(echo_penalties(&self.linking_feature_penalties));

        lines.push(echo_enabled("Gap-closing", self.allow_gap_closing));
        if self.allow_gap_closing {
            lines.push(format!("  - max distance: {:.1}", self.gap_closing_max_distance));
            lines.push(format!("  - max frame gap: {}", self.gap_closing_max_frame_gap));
            lines.push(echo_penalties(&self.gap_closing_feature_penalties));
        }

        lines.push(echo_enabled("Track merging", self.allow_track_merging));
        if self.allow_track_merging {
            lines.push(format!("  - max distance: {:.1}", self.merging_max_distance));
            lines.push(echo_penalties(&self.merging_feature_penalties));
        }

        lines.push(echo_enabled("Track splitting", self.allow_track_splitting));
        if self.allow_track_splitting {
            lines.push(format!("  - max distance: {:.1}", self.splitting_max_distance));
            lines.push(echo_penalties(&self.splitting_feature_penalties));
        }

        lines.push("Cost parameters:".to_string());
        lines.push(format!("  - blocking value: {:e}", self.blocking_value));
        lines.push(format!(
            "  - alternative linking cost factor: {:.2}",
            self.alternative_linking_cost_factor
        ));
        lines.push(format!("  - cutoff percentile: {:.2}", self.cutoff_percentile));
        lines.push(format!(
            "Execution: {} thread(s), {:?} matrices, {:?} solver",
            self.num_threads, self.matrix_kind, self.solver
        ));
        lines.join("\n")
    }
}

fn echo_enabled(name: &str, enabled: bool) -> String {
    if enabled {
        format!("{name} conditions:")
    } else {
        format!("{name} not allowed.")
    }
}

fn echo_penalties(penalties: &BTreeMap<String, f64>) -> String {
    if penalties.is_empty() {
        return "  - no feature penalties".to_string();
    }
    let entries: Vec<String> = penalties
        .iter()
        .map(|(feature, weight)| format!("{feature}: {weight:.1}"))
        .collect();
    format!("  - feature penalties: {}", entries.join(", "))
}
