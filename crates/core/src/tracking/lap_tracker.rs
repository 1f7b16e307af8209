use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::assignment::infrastructure::solver_factory::create_solver;
use crate::cost::domain::link_candidates::LinkingError;
use crate::cost::domain::sparse_cost_matrix::SparseMatrixError;
use crate::shared::config_error::ConfigError;
use crate::shared::spot::Trackable;
use crate::shared::spot_collection::SpotCollection;
use crate::shared::trajectory_graph::TrajectoryGraph;
use crate::shared::worker_pool::{WorkerPanicked, WorkerPool};

use super::domain::tracker_logger::{NullTrackerLogger, TrackerLogger};
use super::domain::tracker_settings::TrackerSettings;
use super::infrastructure::frame_to_frame_linker::FrameToFrameLinker;
use super::infrastructure::segment_linker::{SegmentLinker, SegmentLinkingError};

/// Run-level failure of [`LapTracker::process`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("the object collection is empty")]
    EmptyCollection,

    #[error("tracking was cancelled")]
    Cancelled,

    #[error("cost matrix error: {0}")]
    Matrix(#[from] SparseMatrixError),

    #[error(transparent)]
    WorkerPanicked(#[from] WorkerPanicked),
}

impl From<LinkingError> for TrackingError {
    fn from(err: LinkingError) -> Self {
        match err {
            LinkingError::Matrix(e) => Self::Matrix(e),
            LinkingError::Shape(reason) => Self::Matrix(SparseMatrixError::DimensionMismatch(reason)),
            LinkingError::Worker(e) => Self::WorkerPanicked(e),
        }
    }
}

/// Links objects across frames into trajectories.
///
/// Phase A links each frame to the next non-empty one. Phase B then closes
/// gaps between the resulting segments and, if enabled, merges and splits
/// them. Both phases solve the linear assignment problem with the
/// no-linking complement of Jaqaman et al. (2008).
///
/// ```no_run
/// use laptrack_core::shared::spot::Spot;
/// use laptrack_core::shared::spot_collection::SpotCollection;
/// use laptrack_core::tracking::domain::tracker_settings::TrackerSettings;
/// use laptrack_core::tracking::lap_tracker::LapTracker;
///
/// let spots: SpotCollection<Spot> = vec![
///     Spot::new(1, 0, [0.0, 0.0]),
///     Spot::new(2, 1, [1.0, 0.0]),
/// ]
/// .into_iter()
/// .collect();
/// let mut tracker = LapTracker::new(&spots, TrackerSettings::default());
/// let graph = tracker.process()?;
/// assert_eq!(graph.edge_count(), 1);
/// # Ok::<(), laptrack_core::tracking::lap_tracker::TrackingError>(())
/// ```
pub struct LapTracker<'a, T> {
    spots: &'a SpotCollection<T>,
    settings: TrackerSettings,
    logger: Box<dyn TrackerLogger>,
    cancelled: Arc<AtomicBool>,
    graph: Option<TrajectoryGraph>,
    processing_time: Duration,
    error_message: Option<String>,
}

impl<'a, T: Trackable + Sync> LapTracker<'a, T> {
    pub fn new(spots: &'a SpotCollection<T>, settings: TrackerSettings) -> Self {
        Self {
            spots,
            settings,
            logger: Box::new(NullTrackerLogger),
            cancelled: Arc::new(AtomicBool::new(false)),
            graph: None,
            processing_time: Duration::ZERO,
            error_message: None,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn TrackerLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Shares an abort flag with the caller. Setting it stops the run
    /// between frame pairs.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Validates the settings and rejects an empty collection.
    pub fn check_input(&self) -> Result<(), TrackingError> {
        self.settings.validate()?;
        if self.spots.is_empty() {
            return Err(TrackingError::EmptyCollection);
        }
        Ok(())
    }

    /// Runs both phases and returns the trajectory graph.
    ///
    /// On failure the message stays available through
    /// [`error_message`](Self::error_message). Frame pairs that fail are
    /// skipped, not fatal: the run still succeeds and the last such failure
    /// is reported the same way.
    pub fn process(&mut self) -> Result<&TrajectoryGraph, TrackingError> {
        let start = Instant::now();
        self.graph = None;
        self.error_message = None;

        let outcome = self.track();
        self.processing_time = start.elapsed();
        self.logger.timing("total", as_ms(self.processing_time));
        self.logger.summary();

        match outcome {
            Ok(graph) => Ok(&*self.graph.insert(graph)),
            Err(e) => {
                log::error!("Tracking failed: {e}");
                self.error_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Graph of the last successful run.
    pub fn result(&self) -> Option<&TrajectoryGraph> {
        self.graph.as_ref()
    }

    /// Wall-clock duration of the last run, successful or not.
    pub fn processing_time(&self) -> Duration {
        self.processing_time
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn track(&mut self) -> Result<TrajectoryGraph, TrackingError> {
        self.check_input()?;
        self.logger.info(&self.settings.echo());

        let pool = WorkerPool::new(self.settings.num_threads);
        let solver = create_solver(self.settings.solver);

        let mut graph = TrajectoryGraph::new();
        for spot in self.spots.iter() {
            graph.add_vertex(spot.id());
        }

        let phase = Instant::now();
        let frame_linker = FrameToFrameLinker::new(
            self.spots,
            self.settings.linking_cost_function()?,
            self.settings.linking_max_distance,
            self.settings.blocking_value,
            self.settings.matrix_kind,
            solver.as_ref(),
        );
        let shared = Mutex::new(graph);
        let report = frame_linker.run(&shared, &pool, &self.cancelled, self.logger.as_mut())?;
        let mut graph = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.logger.timing("frame_linking", as_ms(phase.elapsed()));
        self.logger.metric("frame_links", report.links as f64);
        if report.failed_pairs > 0 {
            self.logger.metric("failed_frame_pairs", report.failed_pairs as f64);
        }
        if report.cancelled || self.cancelled.load(Ordering::Relaxed) {
            return Err(TrackingError::Cancelled);
        }
        let mut last_error = report.last_error;

        let phase = Instant::now();
        match SegmentLinker::new(self.spots, &self.settings, solver.as_ref()).run(&mut graph, &pool) {
            Ok(report) => {
                self.logger.metric("segments", report.segments as f64);
                self.logger.metric("gap_closing_links", report.gap_closing_links as f64);
                self.logger.metric("merging_links", report.merging_links as f64);
                self.logger.metric("splitting_links", report.splitting_links as f64);
            }
            Err(SegmentLinkingError::Config(e)) => return Err(e.into()),
            Err(SegmentLinkingError::Linking(LinkingError::Worker(e))) => return Err(e.into()),
            Err(SegmentLinkingError::Linking(e)) => {
                log::warn!("Segment linking failed, keeping frame links only: {e}");
                last_error = Some(format!("segment linking: {e}"));
            }
        }
        self.logger.timing("segment_linking", as_ms(phase.elapsed()));

        self.error_message = last_error;
        log::info!(
            "Tracked {} objects into {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
