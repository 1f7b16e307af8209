use std::collections::BTreeMap;
use std::time::Instant;

/// Observer of a tracking run: progress, per-phase timings and counters.
///
/// Only the thread that called [`LapTracker::process`] talks to the logger;
/// workers report progress through a channel.
///
/// [`LapTracker::process`]: crate::tracking::lap_tracker::LapTracker::process
pub trait TrackerLogger: Send {
    /// Report frame-pair progress of the linking phase.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named phase took.
    fn timing(&mut self, phase: &str, duration_ms: f64);

    /// Record a counter (e.g. links created, segments found).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullTrackerLogger;

impl TrackerLogger for NullTrackerLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _phase: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger for command-line runs. Progress goes through `log::info!`,
/// throttled to one line every `throttle` frame pairs, and the summary lists
/// each phase's duration and the recorded counters.
pub struct StdoutTrackerLogger {
    throttle: usize,
    timings: BTreeMap<String, f64>,
    metrics: BTreeMap<String, f64>,
    start_time: Instant,
    frame_pairs: usize,
    messages: Vec<String>,
}

impl StdoutTrackerLogger {
    pub fn new(throttle: usize) -> Self {
        Self {
            throttle: throttle.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frame_pairs: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Tracking summary ({} frame pairs, {:.3}s total):",
            self.frame_pairs,
            elapsed_ms / 1000.0
        )];
        for (phase, total_ms) in &self.timings {
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {phase:16}: {total_ms:9.1}ms  ({pct:4.1}%)"));
        }
        for (name, value) in &self.metrics {
            lines.push(format!("  {name}: {value}"));
        }
        Some(lines.join("\n"))
    }

    /// Accumulated duration of a phase.
    pub fn timing_for(&self, phase: &str) -> Option<f64> {
        self.timings.get(phase).copied()
    }

    /// Accumulated value of a counter.
    pub fn metric_for(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutTrackerLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl TrackerLogger for StdoutTrackerLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frame_pairs = total;
        if total > 0 && (current % self.throttle == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Linking: {current}/{total} frame pairs ({pct:.1}%)");
        }
    }

    fn timing(&mut self, phase: &str, duration_ms: f64) {
        *self.timings.entry(phase.to_string()).or_default() += duration_ms;
    }

    fn metric(&mut self, name: &str, value: f64) {
        *self.metrics.entry(name.to_string()).or_default() += value;
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
