use crate::cost::domain::cost_function::CostFunction;
use crate::cost::domain::link_candidates::LinkCandidates;
use crate::shared::spot::{SpotId, Trackable};

/// Frame-to-frame linking problem: every object of one frame against every
/// object of the next non-empty frame, within a distance cutoff.
pub struct FrameLinkCandidates<'a, T> {
    sources: &'a [T],
    targets: &'a [T],
    cost_function: &'a CostFunction,
    max_distance: f64,
    blocking_value: f64,
}

impl<'a, T: Trackable> FrameLinkCandidates<'a, T> {
    pub fn new(
        sources: &'a [T],
        targets: &'a [T],
        cost_function: &'a CostFunction,
        max_distance: f64,
        blocking_value: f64,
    ) -> Self {
        Self {
            sources,
            targets,
            cost_function,
            max_distance,
            blocking_value,
        }
    }
}

impl<T: Trackable + Sync> LinkCandidates for FrameLinkCandidates<'_, T> {
    fn num_sources(&self) -> usize {
        self.sources.len()
    }

    fn num_targets(&self) -> usize {
        self.targets.len()
    }

    fn source_id(&self, row: usize) -> SpotId {
        self.sources[row].id()
    }

    fn target_id(&self, col: usize) -> SpotId {
        self.targets[col].id()
    }

    fn cost(&self, row: usize, col: usize) -> Option<f64> {
        let cost = self.cost_function.compute_linking_cost_for(
            &self.sources[row],
            &self.targets[col],
            self.max_distance,
            self.blocking_value,
        );
        (cost < self.blocking_value).then_some(cost)
    }

    fn alternative_cost(&self, realized: &[f64]) -> Option<f64> {
        self.cost_function.alternative_cost(realized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::domain::alternative_cost::AlternativeCost;
    use crate::shared::spot::Spot;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    #[test]
    fn test_cutoff_and_ids() {
        let f = CostFunction::from_penalties(&BTreeMap::new(), AlternativeCost::max(1.05).unwrap());
        let sources = [Spot::new(1, 0, [0.0, 0.0])];
        let targets = [Spot::new(2, 1, [1.0, 0.0]), Spot::new(3, 1, [50.0, 50.0])];
        let candidates = FrameLinkCandidates::new(&sources, &targets, &f, 5.0, 1e100);
        assert_eq!(candidates.num_sources(), 1);
        assert_eq!(candidates.num_targets(), 2);
        assert_eq!(candidates.target_id(1), 3);
        assert_eq!(candidates.cost(0, 0), Some(1.0));
        assert_eq!(candidates.cost(0, 1), None);
        assert_relative_eq!(candidates.alternative_cost(&[1.0, 2.0]).unwrap(), 2.1);
    }
}
