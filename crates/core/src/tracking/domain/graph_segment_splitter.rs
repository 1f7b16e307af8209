use crate::shared::spot::{SpotId, Trackable};
use crate::shared::spot_collection::SpotCollection;
use crate::shared::trajectory_graph::TrajectoryGraph;

/// A connected run of at least two objects, ordered by frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackSegment {
    pub start: SpotId,
    pub end: SpotId,
    /// Objects strictly between start and end, by frame. Empty unless
    /// interiors were requested.
    pub middles: Vec<SpotId>,
}

/// Splits the frame-linking graph into track segments.
///
/// Every connected component with two or more objects becomes a segment;
/// single objects are kept apart as isolated, and count as both the start
/// and the end of their own one-object segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSegmentSplitter {
    segments: Vec<TrackSegment>,
    isolated: Vec<SpotId>,
}

impl GraphSegmentSplitter {
    pub fn new<T: Trackable>(
        graph: &TrajectoryGraph,
        spots: &SpotCollection<T>,
        keep_middles: bool,
    ) -> Self {
        let mut segments = Vec::new();
        let mut isolated = Vec::new();

        for component in graph.connected_components() {
            let mut members: Vec<(usize, SpotId)> = component
                .into_iter()
                .filter_map(|id| spots.get(id).map(|s| (s.frame(), id)))
                .collect();
            match members.len() {
                0 => {}
                1 => isolated.push(members[0].1),
                _ => {
                    members.sort_unstable();
                    let start = members[0].1;
                    let end = members[members.len() - 1].1;
                    let middles = if keep_middles {
                        members[1..members.len() - 1].iter().map(|&(_, id)| id).collect()
                    } else {
                        Vec::new()
                    };
                    segments.push(TrackSegment { start, end, middles });
                }
            }
        }

        log::debug!(
            "Found {} track segments and {} isolated objects",
            segments.len(),
            isolated.len()
        );
        Self { segments, isolated }
    }

    pub fn segments(&self) -> &[TrackSegment] {
        &self.segments
    }

    pub fn isolated(&self) -> &[SpotId] {
        &self.isolated
    }

    pub fn segment_starts(&self) -> Vec<SpotId> {
        self.segments.iter().map(|s| s.start).collect()
    }

    pub fn segment_ends(&self) -> Vec<SpotId> {
        self.segments.iter().map(|s| s.end).collect()
    }

    /// Interiors of each segment, aligned with [`segment_starts`](Self::segment_starts).
    pub fn segment_middles(&self) -> Vec<Vec<SpotId>> {
        self.segments.iter().map(|s| s.middles.clone()).collect()
    }

    /// True when there is nothing to link: no segment and no isolated object.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.isolated.is_empty()
    }
}
