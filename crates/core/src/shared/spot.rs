use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable identity of a trackable object.
pub type SpotId = u64;

/// Read-only view of a detected object, as needed by the tracker.
///
/// Implementations are owned by the detection stage; the tracker only reads
/// them. A missing feature must yield `None` rather than an error, since cost
/// functions skip undefined features.
pub trait Trackable {
    fn id(&self) -> SpotId;

    fn frame(&self) -> usize;

    fn position(&self) -> &[f64];

    /// Value of the named feature. NaN counts as undefined.
    fn feature(&self, name: &str) -> Option<f64>;

    /// Squared Euclidean distance between the two positions.
    fn square_distance_to(&self, other: &Self) -> f64 {
        self.position()
            .iter()
            .zip(other.position())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// `|f1 - f2| / (f1 + f2)` for the named feature, or `None` when either
    /// side lacks it. Two values summing to zero give 0. The result is
    /// negative when the sum is.
    fn normalized_diff_to(&self, other: &Self, feature: &str) -> Option<f64> {
        let a = self.feature(feature)?;
        let b = other.feature(feature)?;
        if a == -b {
            return Some(0.0);
        }
        Some((a - b).abs() / (a + b))
    }
}

/// A detected object: identity, frame, position and named scalar features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    id: SpotId,
    frame: usize,
    position: Vec<f64>,
    #[serde(default)]
    features: BTreeMap<String, f64>,
}

impl Spot {
    pub fn new(id: SpotId, frame: usize, position: impl Into<Vec<f64>>) -> Self {
        Self {
            id,
            frame,
            position: position.into(),
            features: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: f64) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    pub fn features(&self) -> &BTreeMap<String, f64> {
        &self.features
    }
}

impl Trackable for Spot {
    fn id(&self) -> SpotId {
        self.id
    }

    fn frame(&self) -> usize {
        self.frame
    }

    fn position(&self) -> &[f64] {
        &self.position
    }

    fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied().filter(|v| !v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_square_distance_3d() {
        let a = Spot::new(1, 0, [1.0, 2.0, 3.0]);
        let b = Spot::new(2, 1, [4.0, 6.0, 3.0]);
        assert_relative_eq!(a.square_distance_to(&b), 25.0);
        assert_relative_eq!(b.square_distance_to(&a), 25.0);
    }

    #[test]
    fn test_missing_and_nan_features_are_undefined() {
        let spot = Spot::new(1, 0, [0.0, 0.0]).with_feature("QUALITY", f64::NAN);
        assert_eq!(spot.feature("QUALITY"), None);
        assert_eq!(spot.feature("RADIUS"), None);
    }

    #[rstest]
    #[case(10.0, 30.0, 0.5)]
    #[case(30.0, 10.0, 0.5)]
    #[case(5.0, 5.0, 0.0)]
    #[case(2.0, -2.0, 0.0)]
    #[case(-10.0, -30.0, -0.5)]
    #[case(-30.0, 10.0, -2.0)]
    fn test_normalized_diff(#[case] f1: f64, #[case] f2: f64, #[case] expected: f64) {
        let a = Spot::new(1, 0, [0.0]).with_feature("MEAN", f1);
        let b = Spot::new(2, 1, [0.0]).with_feature("MEAN", f2);
        assert_relative_eq!(a.normalized_diff_to(&b, "MEAN").unwrap(), expected);
    }

    #[test]
    fn test_normalized_diff_undefined_when_one_side_missing() {
        let a = Spot::new(1, 0, [0.0]).with_feature("MEAN", 1.0);
        let b = Spot::new(2, 1, [0.0]);
        assert_eq!(a.normalized_diff_to(&b, "MEAN"), None);
        assert_eq!(b.normalized_diff_to(&a, "MEAN"), None);
    }

    #[test]
    fn test_deserialize_without_features() {
        let spot: Spot = serde_json::from_str(r#"{"id": 7, "frame": 3, "position": [1.5, 2.5]}"#).unwrap();
        assert_eq!(spot.id(), 7);
        assert_eq!(spot.frame(), 3);
        assert_eq!(spot.position(), &[1.5, 2.5]);
        assert!(spot.features().is_empty());
    }
}
