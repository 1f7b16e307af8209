use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::assignment::domain::assignment_solver::AssignmentSolver;
use crate::cost::domain::cost_function::CostFunction;
use crate::cost::domain::link_candidates::LinkingError;
use crate::cost::infrastructure::frame_link_candidates::FrameLinkCandidates;
use crate::shared::spot::Trackable;
use crate::shared::spot_collection::SpotCollection;
use crate::shared::trajectory_graph::TrajectoryGraph;
use crate::shared::worker_pool::{WorkerPanicked, WorkerPool};
use crate::tracking::domain::tracker_logger::TrackerLogger;
use crate::tracking::domain::tracker_settings::MatrixKind;

use super::jaqaman_linker::JaqamanLinker;

/// Outcome of the frame-to-frame phase.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameLinkingReport {
    pub frame_pairs: usize,
    pub links: usize,
    pub failed_pairs: usize,
    /// Message of the last frame pair that failed, if any.
    pub last_error: Option<String>,
    pub cancelled: bool,
}

/// Links every pair of consecutive non-empty frames.
///
/// Frame pairs are independent problems and are solved on the worker pool.
/// Links go straight into the shared graph; progress is reported back to the
/// calling thread, which owns the logger.
pub struct FrameToFrameLinker<'a, T> {
    spots: &'a SpotCollection<T>,
    cost_function: CostFunction,
    max_distance: f64,
    blocking_value: f64,
    matrix_kind: MatrixKind,
    solver: &'a dyn AssignmentSolver,
}

impl<'a, T: Trackable + Sync> FrameToFrameLinker<'a, T> {
    pub fn new(
        spots: &'a SpotCollection<T>,
        cost_function: CostFunction,
        max_distance: f64,
        blocking_value: f64,
        matrix_kind: MatrixKind,
        solver: &'a dyn AssignmentSolver,
    ) -> Self {
        Self {
            spots,
            cost_function,
            max_distance,
            blocking_value,
            matrix_kind,
            solver,
        }
    }

    /// Adds one edge per accepted link to `graph`, weighted by its cost.
    ///
    /// A frame pair whose problem cannot be built is skipped with a warning;
    /// the remaining pairs are still linked. Only a panicking worker aborts
    /// the phase.
    pub fn run(
        &self,
        graph: &Mutex<TrajectoryGraph>,
        pool: &WorkerPool,
        cancelled: &AtomicBool,
        logger: &mut dyn TrackerLogger,
    ) -> Result<FrameLinkingReport, WorkerPanicked> {
        let frame_pairs = self.spots.frame_pairs();
        let total = frame_pairs.len();
        // Enough pairs to keep every worker busy: fill matrix rows inline.
        let inner_pool = if total >= pool.num_threads() {
            WorkerPool::single_threaded()
        } else {
            *pool
        };
        let linker = JaqamanLinker::new(self.matrix_kind, self.solver, self.blocking_value);

        let (progress_tx, progress_rx) = crossbeam_channel::unbounded::<()>();
        let outcomes = thread::scope(|scope| {
            let frame_pairs = &frame_pairs;
            let linker = &linker;
            let inner_pool = &inner_pool;
            let worker = scope.spawn(move || {
                pool.map_indexed_until(total, cancelled, |k| {
                    let (from, to) = frame_pairs[k];
                    let outcome = self.link_pair(from, to, linker, inner_pool, graph);
                    let _ = progress_tx.send(());
                    outcome
                })
            });

            let mut done = 0;
            for () in progress_rx.iter() {
                done += 1;
                logger.progress(done, total);
            }
            worker.join().map_err(|_| WorkerPanicked)?
        })?;

        let mut report = FrameLinkingReport {
            frame_pairs: total,
            ..FrameLinkingReport::default()
        };
        for (k, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok(links)) => report.links += links,
                Some(Err(e)) => {
                    let (from, to) = frame_pairs[k];
                    log::warn!("Linking frame {from} to frame {to} failed: {e}");
                    report.failed_pairs += 1;
                    report.last_error = Some(format!("frames {from} -> {to}: {e}"));
                }
                None => report.cancelled = true,
            }
        }
        report.cancelled |= cancelled.load(Ordering::Relaxed);
        log::debug!(
            "Frame linking: {} links over {} frame pairs",
            report.links,
            report.frame_pairs
        );
        Ok(report)
    }

    fn link_pair(
        &self,
        from: usize,
        to: usize,
        linker: &JaqamanLinker<'_>,
        pool: &WorkerPool,
        graph: &Mutex<TrajectoryGraph>,
    ) -> Result<usize, LinkingError> {
        let candidates = FrameLinkCandidates::new(
            self.spots.frame(from),
            self.spots.frame(to),
            &self.cost_function,
            self.max_distance,
            self.blocking_value,
        );
        let links = linker.link(&candidates, pool)?;

        let mut graph = graph.lock().unwrap_or_else(PoisonError::into_inner);
        let added = links
            .iter()
            .filter(|l| graph.add_edge(l.source, l.target, l.cost))
            .count();
        Ok(added)
    }
}
