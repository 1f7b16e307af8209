use std::collections::BTreeMap;

use crate::cost::domain::alternative_cost::AlternativeCost;
use crate::cost::domain::cost_function::CostFunction;
use crate::cost::domain::link_candidates::LinkCandidates;
use crate::shared::config_error::ConfigError;
use crate::shared::spot::{SpotId, Trackable};
use crate::shared::spot_collection::SpotCollection;
use crate::tracking::domain::graph_segment_splitter::GraphSegmentSplitter;
use crate::tracking::domain::tracker_settings::TrackerSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Start,
    End,
    Interior,
}

struct Node<'a, T> {
    spot: &'a T,
    segment: usize,
    role: Role,
}

/// Cost function and distance cutoff of one link family.
struct LinkRule {
    cost_function: CostFunction,
    max_distance: f64,
}

/// Linking problem between track segments.
///
/// Sources are segment ends, followed by segment interiors when splitting is
/// allowed. Targets are segment starts, followed by interiors when merging is
/// allowed. Isolated objects act as the start and end of their own segment.
///
/// - end → start (gap closing): `1 ≤ Δframe ≤ max frame gap`
/// - end → interior (merging): `Δframe == 1`
/// - interior → start (splitting): `Δframe == 1`
///
/// Pairs within one segment and interior → interior pairs are never allowed.
pub struct SegmentLinkCandidates<'a, T> {
    sources: Vec<Node<'a, T>>,
    targets: Vec<Node<'a, T>>,
    gap_closing: Option<LinkRule>,
    merging: Option<LinkRule>,
    splitting: Option<LinkRule>,
    max_frame_gap: usize,
    blocking_value: f64,
    alternative: AlternativeCost,
}

impl<'a, T: Trackable> SegmentLinkCandidates<'a, T> {
    pub fn new(
        spots: &'a SpotCollection<T>,
        splitter: &GraphSegmentSplitter,
        settings: &TrackerSettings,
    ) -> Result<Self, ConfigError> {
        let alternative = settings.segment_alternative()?;
        let rule = |enabled: bool, penalties: &BTreeMap<String, f64>, max_distance: f64| {
            enabled.then(|| LinkRule {
                cost_function: CostFunction::from_penalties(penalties, alternative),
                max_distance,
            })
        };

        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let node = |id: SpotId, segment: usize, role: Role| {
            spots.get(id).map(|spot| Node { spot, segment, role })
        };
        for (segment, track) in splitter.segments().iter().enumerate() {
            sources.extend(node(track.end, segment, Role::End));
            targets.extend(node(track.start, segment, Role::Start));
        }
        let offset = splitter.segments().len();
        for (k, &id) in splitter.isolated().iter().enumerate() {
            sources.extend(node(id, offset + k, Role::End));
            targets.extend(node(id, offset + k, Role::Start));
        }
        for (segment, track) in splitter.segments().iter().enumerate() {
            for &id in &track.middles {
                if settings.allow_track_splitting {
                    sources.extend(node(id, segment, Role::Interior));
                }
                if settings.allow_track_merging {
                    targets.extend(node(id, segment, Role::Interior));
                }
            }
        }

        Ok(Self {
            sources,
            targets,
            gap_closing: rule(
                settings.allow_gap_closing,
                &settings.gap_closing_feature_penalties,
                settings.gap_closing_max_distance,
            ),
            merging: rule(
                settings.allow_track_merging,
                &settings.merging_feature_penalties,
                settings.merging_max_distance,
            ),
            splitting: rule(
                settings.allow_track_splitting,
                &settings.splitting_feature_penalties,
                settings.splitting_max_distance,
            ),
            max_frame_gap: settings.gap_closing_max_frame_gap,
            blocking_value: settings.blocking_value,
            alternative,
        })
    }
}

impl<T: Trackable + Sync> LinkCandidates for SegmentLinkCandidates<'_, T> {
    fn num_sources(&self) -> usize {
        self.sources.len()
    }

    fn num_targets(&self) -> usize {
        self.targets.len()
    }

    fn source_id(&self, row: usize) -> SpotId {
        self.sources[row].spot.id()
    }

    fn target_id(&self, col: usize) -> SpotId {
        self.targets[col].spot.id()
    }

    fn cost(&self, row: usize, col: usize) -> Option<f64> {
        let source = &self.sources[row];
        let target = &self.targets[col];
        if source.segment == target.segment {
            return None;
        }
        let frame_gap = target.spot.frame().checked_sub(source.spot.frame())?;
        if frame_gap == 0 {
            return None;
        }

        let rule = match (source.role, target.role) {
            (Role::End, Role::Start) if frame_gap <= self.max_frame_gap => self.gap_closing.as_ref(),
            (Role::End, Role::Interior) if frame_gap == 1 => self.merging.as_ref(),
            (Role::Interior, Role::Start) if frame_gap == 1 => self.splitting.as_ref(),
            _ => None,
        }?;

        let cost = rule.cost_function.compute_linking_cost_for(
            source.spot,
            target.spot,
            rule.max_distance,
            self.blocking_value,
        );
        (cost < self.blocking_value).then_some(cost)
    }

    fn alternative_cost(&self, realized: &[f64]) -> Option<f64> {
        self.alternative.compute(realized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::spot::Spot;
    use crate::shared::trajectory_graph::TrajectoryGraph;

    /// Segment A: 1(f0) - 2(f1) - 3(f2) - 4(f3), segment B: 5(f5) - 6(f6),
    /// isolated 7(f2).
    fn fixture() -> (TrajectoryGraph, SpotCollection<Spot>) {
        let spots: SpotCollection<Spot> = vec![
            Spot::new(1, 0, [0.0, 0.0]),
            Spot::new(2, 1, [1.0, 0.0]),
            Spot::new(3, 2, [2.0, 0.0]),
            Spot::new(4, 3, [3.0, 0.0]),
            Spot::new(5, 5, [4.0, 0.0]),
            Spot::new(6, 6, [5.0, 0.0]),
            Spot::new(7, 2, [2.0, 1.0]),
        ]
        .into_iter()
        .collect();
        let mut graph = TrajectoryGraph::new();
        graph.add_vertex(7);
        graph.add_edge(1, 2, 1.0);
        graph.add_edge(2, 3, 1.0);
        graph.add_edge(3, 4, 1.0);
        graph.add_edge(5, 6, 1.0);
        (graph, spots)
    }

    fn find(c: &SegmentLinkCandidates<'_, Spot>, source: SpotId, target: SpotId) -> Option<f64> {
        let row = (0..c.num_sources()).find(|&r| c.source_id(r) == source)?;
        let col = (0..c.num_targets()).find(|&k| c.target_id(k) == target)?;
        c.cost(row, col)
    }

    #[test]
    fn test_gap_closing_only() {
        let (graph, spots) = fixture();
        let settings = TrackerSettings {
            gap_closing_max_frame_gap: 2,
            ..TrackerSettings::default()
        };
        let splitter = GraphSegmentSplitter::new(&graph, &spots, false);
        let c = SegmentLinkCandidates::new(&spots, &splitter, &settings).unwrap();
        // ends: 4, 6, 7 ; starts: 1, 5, 7
        assert_eq!(c.num_sources(), 3);
        assert_eq!(c.num_targets(), 3);
        // 4(f3) -> 5(f5): gap 2, distance 1
        assert_eq!(find(&c, 4, 5), Some(1.0));
        // 7(f2) -> 5(f5): gap 3 exceeds the max frame gap
        assert_eq!(find(&c, 7, 5), None);
        // backwards in time
        assert_eq!(find(&c, 6, 1), None);
        // same segment (isolated object to itself)
        assert_eq!(find(&c, 7, 7), None);
    }

    #[test]
    fn test_gap_closing_disabled_blocks_everything() {
        let (graph, spots) = fixture();
        let settings = TrackerSettings {
            allow_gap_closing: false,
            ..TrackerSettings::default()
        };
        let splitter = GraphSegmentSplitter::new(&graph, &spots, false);
        let c = SegmentLinkCandidates::new(&spots, &splitter, &settings).unwrap();
        for row in 0..c.num_sources() {
            for col in 0..c.num_targets() {
                assert_eq!(c.cost(row, col), None);
            }
        }
    }

    #[test]
    fn test_merging_and_splitting_need_adjacent_frames() {
        let (graph, spots) = fixture();
        let settings = TrackerSettings {
            allow_gap_closing: false,
            allow_track_merging: true,
            allow_track_splitting: true,
            ..TrackerSettings::default()
        };
        let splitter = GraphSegmentSplitter::new(&graph, &spots, true);
        let c = SegmentLinkCandidates::new(&spots, &splitter, &settings).unwrap();
        // interiors 2, 3 are both sources and targets
        assert_eq!(c.num_sources(), 5);
        assert_eq!(c.num_targets(), 5);
        // isolated 7(f2) ends, merges into interior 3? same frame: no.
        assert_eq!(find(&c, 7, 3), None);
        // interior 2(f1) splits to isolated 7(f2)
        assert_eq!(find(&c, 2, 7), Some(2.0));
        // end 7(f2) cannot merge into interior 2(f1), it is earlier
        assert_eq!(find(&c, 7, 2), None);
        // interior to interior is never allowed
        assert_eq!(find(&c, 2, 3), None);
        // gap closing is off
        assert_eq!(find(&c, 4, 5), None);
    }
}
