use std::collections::HashSet;

use thiserror::Error;

use crate::assignment::domain::assignment_solver::AssignmentSolver;
use crate::cost::domain::link_candidates::LinkingError;
use crate::cost::infrastructure::segment_link_candidates::SegmentLinkCandidates;
use crate::shared::config_error::ConfigError;
use crate::shared::spot::Trackable;
use crate::shared::spot_collection::SpotCollection;
use crate::shared::trajectory_graph::TrajectoryGraph;
use crate::shared::worker_pool::WorkerPool;
use crate::tracking::domain::graph_segment_splitter::GraphSegmentSplitter;
use crate::tracking::domain::tracker_settings::TrackerSettings;

use super::jaqaman_linker::JaqamanLinker;

/// Failure of the segment linking phase.
#[derive(Error, Debug)]
pub enum SegmentLinkingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Linking(#[from] LinkingError),
}

/// Outcome of the segment linking phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentLinkingReport {
    pub segments: usize,
    pub isolated: usize,
    pub gap_closing_links: usize,
    pub merging_links: usize,
    pub splitting_links: usize,
}

impl SegmentLinkingReport {
    pub fn links(&self) -> usize {
        self.gap_closing_links + self.merging_links + self.splitting_links
    }
}

/// Bridges gaps between track segments, and optionally merges and splits
/// them, by solving one global assignment over the frame-linked graph.
pub struct SegmentLinker<'a, T> {
    spots: &'a SpotCollection<T>,
    settings: &'a TrackerSettings,
    solver: &'a dyn AssignmentSolver,
}

impl<'a, T: Trackable + Sync> SegmentLinker<'a, T> {
    pub fn new(
        spots: &'a SpotCollection<T>,
        settings: &'a TrackerSettings,
        solver: &'a dyn AssignmentSolver,
    ) -> Self {
        Self {
            spots,
            settings,
            solver,
        }
    }

    /// Adds the accepted segment links to `graph`.
    ///
    /// Does nothing when gap closing, merging and splitting are all disabled,
    /// or when the graph holds no segment and no isolated object.
    pub fn run(
        &self,
        graph: &mut TrajectoryGraph,
        pool: &WorkerPool,
    ) -> Result<SegmentLinkingReport, SegmentLinkingError> {
        if !self.settings.links_segments() {
            log::debug!("Segment linking disabled");
            return Ok(SegmentLinkingReport::default());
        }

        let keep_middles = self.settings.allow_track_merging || self.settings.allow_track_splitting;
        let splitter = GraphSegmentSplitter::new(graph, self.spots, keep_middles);
        let mut report = SegmentLinkingReport {
            segments: splitter.segments().len(),
            isolated: splitter.isolated().len(),
            ..SegmentLinkingReport::default()
        };
        if splitter.is_empty() {
            return Ok(report);
        }

        let candidates = SegmentLinkCandidates::new(self.spots, &splitter, self.settings)?;
        let linker = JaqamanLinker::new(
            self.settings.matrix_kind,
            self.solver,
            self.settings.blocking_value,
        );
        let links = linker.link(&candidates, pool)?;

        let interiors: HashSet<_> = splitter
            .segments()
            .iter()
            .flat_map(|s| s.middles.iter().copied())
            .collect();
        for link in links {
            if !graph.add_edge(link.source, link.target, link.cost) {
                continue;
            }
            if interiors.contains(&link.target) {
                report.merging_links += 1;
            } else if interiors.contains(&link.source) {
                report.splitting_links += 1;
            } else {
                report.gap_closing_links += 1;
            }
        }

        log::debug!(
            "Segment linking: {} gap-closing, {} merging, {} splitting links",
            report.gap_closing_links,
            report.merging_links,
            report.splitting_links
        );
        Ok(report)
    }
}
