use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use laptrack_core::assignment::infrastructure::solver_factory::SolverKind;
use laptrack_core::shared::spot::Spot;
use laptrack_core::shared::spot_collection::SpotCollection;
use laptrack_core::shared::trajectory_graph::{Edge, TrajectoryGraph};
use laptrack_core::tracking::domain::tracker_logger::StdoutTrackerLogger;
use laptrack_core::tracking::domain::tracker_settings::{MatrixKind, TrackerSettings};
use laptrack_core::tracking::lap_tracker::LapTracker;

/// Links detected objects across frames into trajectories.
#[derive(Parser)]
#[command(name = "laptrack")]
struct Cli {
    /// JSON array of objects: {id, frame, position, features}.
    spots: PathBuf,

    /// Tracker settings as JSON. Command-line flags override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the edge list here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Max distance for frame-to-frame links.
    #[arg(long)]
    max_distance: Option<f64>,

    /// Max number of frames bridged by gap closing.
    #[arg(long)]
    max_frame_gap: Option<usize>,

    /// Disable gap closing.
    #[arg(long)]
    no_gap_closing: bool,

    /// Allow track merging.
    #[arg(long)]
    merging: bool,

    /// Allow track splitting.
    #[arg(long)]
    splitting: bool,

    /// Worker threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Assignment solver: hungarian or jv.
    #[arg(long)]
    solver: Option<String>,

    /// Use dense cost matrices.
    #[arg(long)]
    dense: bool,
}

#[derive(Serialize)]
struct TrackingOutput {
    edges: Vec<Edge>,
    processing_time_ms: f64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let spots = load_spots(&cli.spots)?;
    let settings = build_settings(&cli)?;
    log::info!("Loaded {} objects from {}", spots.len(), cli.spots.display());

    let mut tracker = LapTracker::new(&spots, settings)
        .with_logger(Box::new(StdoutTrackerLogger::default()));
    let graph = tracker.process()?.clone();
    let processing_time_ms = tracker.processing_time().as_secs_f64() * 1000.0;
    if let Some(message) = tracker.error_message() {
        log::warn!("Tracking finished with errors: {message}");
    }

    let json = render_output(&graph, processing_time_ms)?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("Edges written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn load_spots(path: &Path) -> Result<SpotCollection<Spot>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let spots: Vec<Spot> = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid spots file {}: {e}", path.display()))?;
    Ok(spots.into_iter().collect())
}

fn build_settings(cli: &Cli) -> Result<TrackerSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.settings {
        Some(path) => TrackerSettings::from_json(&fs::read_to_string(path)?)?,
        None => TrackerSettings::default(),
    };

    if let Some(d) = cli.max_distance {
        settings.linking_max_distance = d;
    }
    if let Some(gap) = cli.max_frame_gap {
        settings.gap_closing_max_frame_gap = gap;
    }
    if cli.no_gap_closing {
        settings.allow_gap_closing = false;
    }
    if cli.merging {
        settings.allow_track_merging = true;
    }
    if cli.splitting {
        settings.allow_track_splitting = true;
    }
    if let Some(threads) = cli.threads {
        settings.num_threads = threads;
    }
    if let Some(solver) = &cli.solver {
        settings.solver = parse_solver(solver)?;
    }
    if cli.dense {
        settings.matrix_kind = MatrixKind::Dense;
    }

    settings.validate()?;
    Ok(settings)
}

fn render_output(
    graph: &TrajectoryGraph,
    processing_time_ms: f64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&TrackingOutput {
        edges: graph.sorted_edges(),
        processing_time_ms,
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.spots.exists() {
        return Err(format!("Spots file not found: {}", cli.spots.display()).into());
    }
    if let Some(path) = &cli.settings {
        if !path.exists() {
            return Err(format!("Settings file not found: {}", path.display()).into());
        }
    }
    if cli.threads == Some(0) {
        return Err("Threads must be at least 1".into());
    }
    if let Some(solver) = &cli.solver {
        parse_solver(solver)?;
    }
    Ok(())
}

fn parse_solver(name: &str) -> Result<SolverKind, String> {
    match name {
        "hungarian" => Ok(SolverKind::Hungarian),
        "jv" | "jonker-volgenant" => Ok(SolverKind::JonkerVolgenant),
        other => Err(format!(
            "Solver must be 'hungarian' or 'jv', got '{other}'"
        )),
    }
}
