use crate::shared::config_error::{require_positive, ConfigError};
use crate::shared::math;

/// How the cost of "linking to nothing" is derived from the costs realized in
/// one linking problem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AlternativeCost {
    /// `factor × max(costs)`.
    Max { factor: f64 },
    /// `factor × percentile(costs, percentile)`.
    Percentile { factor: f64, percentile: f64 },
}

impl AlternativeCost {
    pub fn max(factor: f64) -> Result<Self, ConfigError> {
        require_positive("alternative_linking_cost_factor", factor)?;
        Ok(Self::Max { factor })
    }

    pub fn percentile(factor: f64, percentile: f64) -> Result<Self, ConfigError> {
        require_positive("alternative_linking_cost_factor", factor)?;
        if !(0.0..=1.0).contains(&percentile) {
            return Err(ConfigError::invalid(
                "cutoff_percentile",
                format!("expected a value in [0, 1], got {percentile}"),
            ));
        }
        Ok(Self::Percentile { factor, percentile })
    }

    /// Alternative cost over the realized (non-blocked) costs, or `None` when
    /// there are none.
    pub fn compute(&self, costs: &[f64]) -> Option<f64> {
        match *self {
            Self::Max { factor } => math::max(costs).map(|m| factor * m),
            Self::Percentile { factor, percentile } => {
                math::percentile(costs, percentile).map(|p| factor * p)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(-1.05)]
    fn test_non_positive_factor_rejected(#[case] factor: f64) {
        assert!(AlternativeCost::max(factor).is_err());
        assert!(AlternativeCost::percentile(factor, 0.9).is_err());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn test_percentile_out_of_range_rejected(#[case] p: f64) {
        let err = AlternativeCost::percentile(1.05, p).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "cutoff_percentile", .. }));
    }

    #[test]
    fn test_max_policy() {
        let alt = AlternativeCost::max(1.05).unwrap();
        assert_relative_eq!(alt.compute(&[1.0, 4.0, 2.0]).unwrap(), 4.2);
    }

    #[test]
    fn test_percentile_policy() {
        let alt = AlternativeCost::percentile(2.0, 0.5).unwrap();
        assert_relative_eq!(alt.compute(&[1.0, 3.0, 2.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_full_percentile_matches_max() {
        let costs = [3.0, 9.0, 1.0, 7.0];
        let by_max = AlternativeCost::max(1.05).unwrap().compute(&costs);
        let by_percentile = AlternativeCost::percentile(1.05, 1.0).unwrap().compute(&costs);
        assert_eq!(by_max, by_percentile);
    }

    #[test]
    fn test_no_costs_gives_none() {
        assert_eq!(AlternativeCost::max(1.05).unwrap().compute(&[]), None);
    }
}
