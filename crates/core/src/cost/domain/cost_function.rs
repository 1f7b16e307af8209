use std::collections::BTreeMap;

use crate::shared::constants::{FEATURE_PENALTY_SCALE, ZERO_DISTANCE_FLOOR};
use crate::shared::spot::Trackable;

use super::alternative_cost::AlternativeCost;

/// How the cost of linking two objects is computed.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkingCost {
    /// Squared Euclidean distance.
    SquareDistance,
    /// Squared distance scaled by a penalty built from normalized feature
    /// differences, each weighted by its entry in the map.
    FeaturePenalized(BTreeMap<String, f64>),
}

/// Linking cost paired with the policy for the cost of not linking.
#[derive(Clone, Debug, PartialEq)]
pub struct CostFunction {
    linking: LinkingCost,
    alternative: AlternativeCost,
}

impl CostFunction {
    pub fn new(linking: LinkingCost, alternative: AlternativeCost) -> Self {
        Self {
            linking,
            alternative,
        }
    }

    /// Square distance when `penalties` is empty, feature-penalized otherwise.
    pub fn from_penalties(penalties: &BTreeMap<String, f64>, alternative: AlternativeCost) -> Self {
        let linking = if penalties.is_empty() {
            LinkingCost::SquareDistance
        } else {
            LinkingCost::FeaturePenalized(penalties.clone())
        };
        Self::new(linking, alternative)
    }

    pub fn linking(&self) -> &LinkingCost {
        &self.linking
    }

    /// Non-negative cost of linking `source` to `target`.
    pub fn linking_cost<T: Trackable>(&self, source: &T, target: &T) -> f64 {
        let d2 = source.square_distance_to(target);
        match &self.linking {
            LinkingCost::SquareDistance => d2,
            LinkingCost::FeaturePenalized(penalties) => {
                let d2 = if d2 == 0.0 { ZERO_DISTANCE_FLOOR } else { d2 };
                let penalty = 1.0
                    + penalties
                        .iter()
                        .filter_map(|(feature, weight)| {
                            source
                                .normalized_diff_to(target, feature)
                                .map(|ndiff| weight * FEATURE_PENALTY_SCALE * ndiff)
                        })
                        .sum::<f64>();
                d2 * penalty * penalty
            }
        }
    }

    /// Linking cost, or `blocking_value` when the objects are further apart
    /// than `max_distance`.
    pub fn compute_linking_cost_for<T: Trackable>(
        &self,
        source: &T,
        target: &T,
        max_distance: f64,
        blocking_value: f64,
    ) -> f64 {
        if source.square_distance_to(target) > max_distance * max_distance {
            return blocking_value;
        }
        self.linking_cost(source, target)
    }

    /// Cost of linking to nothing, derived from all realized costs of one
    /// problem. `None` when no cost was realized.
    pub fn alternative_cost(&self, costs: &[f64]) -> Option<f64> {
        self.alternative.compute(costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::spot::Spot;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn penalized(entries: &[(&str, f64)]) -> CostFunction {
        let penalties = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        CostFunction::from_penalties(&penalties, AlternativeCost::max(1.05).unwrap())
    }

    #[test]
    fn test_square_distance() {
        let f = CostFunction::from_penalties(&BTreeMap::new(), AlternativeCost::max(1.05).unwrap());
        assert_eq!(f.linking(), &LinkingCost::SquareDistance);
        let a = Spot::new(1, 0, [0.0, 0.0]);
        let b = Spot::new(2, 1, [50.0, 50.0]);
        assert_relative_eq!(f.linking_cost(&a, &b), 5000.0);
    }

    #[test]
    fn test_feature_penalty_scales_distance() {
        let f = penalized(&[("MEAN", 1.0)]);
        let a = Spot::new(1, 0, [0.0, 0.0]).with_feature("MEAN", 10.0);
        let b = Spot::new(2, 1, [3.0, 4.0]).with_feature("MEAN", 30.0);
        // ndiff = 0.5, penalty = 1 + 1.5 * 0.5 = 1.75
        assert_relative_eq!(f.linking_cost(&a, &b), 25.0 * 1.75 * 1.75);
    }

    #[test]
    fn test_feature_penalty_skips_undefined_features() {
        let f = penalized(&[("MEAN", 1.0), ("RADIUS", 2.0)]);
        let a = Spot::new(1, 0, [0.0, 0.0]).with_feature("MEAN", 10.0);
        let b = Spot::new(2, 1, [3.0, 4.0])
            .with_feature("MEAN", 10.0)
            .with_feature("RADIUS", 4.0);
        assert_relative_eq!(f.linking_cost(&a, &b), 25.0);
    }

    #[test]
    fn test_zero_distance_is_floored() {
        let f = penalized(&[("MEAN", 1.0)]);
        let a = Spot::new(1, 0, [1.0, 1.0]).with_feature("MEAN", 1.0);
        let b = Spot::new(2, 1, [1.0, 1.0]).with_feature("MEAN", 3.0);
        let cost = f.linking_cost(&a, &b);
        assert!(cost > 0.0);
        assert!(cost.is_finite());
    }

    #[test]
    fn test_feature_penalty_is_symmetric() {
        let f = penalized(&[("MEAN", 0.7), ("QUALITY", 2.0)]);
        let a = Spot::new(1, 0, [1.0, 2.0])
            .with_feature("MEAN", 12.0)
            .with_feature("QUALITY", 3.0);
        let b = Spot::new(2, 1, [4.0, -2.0])
            .with_feature("MEAN", 5.0)
            .with_feature("QUALITY", 8.0);
        assert_relative_eq!(f.linking_cost(&a, &b), f.linking_cost(&b, &a));
    }

    #[test]
    fn test_feature_penalty_is_symmetric_on_random_pairs() {
        let mut rng = StdRng::seed_from_u64(42);
        let f = penalized(&[("MEAN", 1.0), ("RADIUS", 0.3)]);
        for _ in 0..200 {
            let mut spot = |id| {
                Spot::new(id, 0, [rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)])
                    .with_feature("MEAN", rng.gen_range(-5.0..100.0))
                    .with_feature("RADIUS", rng.gen_range(0.5..3.0))
            };
            let a = spot(1);
            let b = spot(2);
            assert_relative_eq!(f.linking_cost(&a, &b), f.linking_cost(&b, &a), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_cutoff_blocks_far_pairs() {
        let f = penalized(&[]);
        let a = Spot::new(1, 0, [0.0, 0.0]);
        let near = Spot::new(2, 1, [1.0, 0.0]);
        let far = Spot::new(3, 1, [50.0, 50.0]);
        assert_relative_eq!(f.compute_linking_cost_for(&a, &near, 5.0, 1e100), 1.0);
        assert_eq!(f.compute_linking_cost_for(&a, &far, 5.0, 1e100), 1e100);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let f = penalized(&[]);
        let a = Spot::new(1, 0, [0.0, 0.0]);
        let b = Spot::new(2, 1, [3.0, 4.0]);
        assert_relative_eq!(f.compute_linking_cost_for(&a, &b, 5.0, 1e100), 25.0);
    }
}
