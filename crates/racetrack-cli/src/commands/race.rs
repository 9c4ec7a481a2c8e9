//! Race command handler for planning routes on a map.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ValueEnum;

use racetrack_lib::{
    load_track, resolve_map, spawn_race, wait_for_race, RaceAlgorithm, RaceRequest, RaceSummary,
};

use crate::output::{print_footer, render, OutputFormat};
use crate::terminal::ColorPalette;

/// Search algorithm names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AlgorithmArg {
    /// Depth-first search.
    Dfs,
    /// Breadth-first search (fewest moves).
    Bfs,
    /// Greedy best-first search.
    Greedy,
    /// A* search (cheapest route).
    #[default]
    #[value(name = "a-star", alias = "astar")]
    AStar,
}

impl From<AlgorithmArg> for RaceAlgorithm {
    fn from(value: AlgorithmArg) -> Self {
        match value {
            AlgorithmArg::Dfs => RaceAlgorithm::Dfs,
            AlgorithmArg::Bfs => RaceAlgorithm::Bfs,
            AlgorithmArg::Greedy => RaceAlgorithm::Greedy,
            AlgorithmArg::AStar => RaceAlgorithm::AStar,
        }
    }
}

/// Arguments for the race command.
#[derive(Debug, Clone)]
pub struct RaceCommandArgs {
    /// Map name (stem or file name inside the maps folder) or path.
    pub map: String,
    pub algorithm: AlgorithmArg,
    /// Number of cars; every start cell races when unset.
    pub cars: Option<usize>,
    pub format: OutputFormat,
    /// Include raw state-space nodes in the output.
    pub show_nodes: bool,
}

impl RaceCommandArgs {
    /// Convert CLI args to a library request.
    pub fn to_request(&self) -> RaceRequest {
        let request = RaceRequest::new(self.algorithm.into());
        match self.cars {
            Some(cars) => request.with_cars(cars),
            None => request,
        }
    }
}

/// Handle the race subcommand.
///
/// Planning runs on the blocking pool; this task only waits for the result.
pub async fn handle_race(maps_dir: &Path, args: &RaceCommandArgs) -> Result<()> {
    let started = Instant::now();
    let path = resolve_map(maps_dir, &args.map)?;
    let track = load_track(&path)
        .with_context(|| format!("failed to load map from {}", path.display()))?;
    let map_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string);

    let request = args.to_request();
    tracing::debug!(
        "racing {} on {} with {}",
        request
            .cars
            .map_or_else(|| "every car".to_string(), |cars| format!("{cars} car(s)")),
        path.display(),
        request.algorithm
    );

    let outcome = wait_for_race(spawn_race(Arc::new(track), request))
        .await
        .with_context(|| format!("failed to plan a race on {}", path.display()))?;

    let summary = RaceSummary::from_plan(map_name.as_deref(), &outcome.plan, args.show_nodes);
    render(&summary, args.format)?;
    if args.format == OutputFormat::Text {
        print_footer(started.elapsed(), &ColorPalette::detect());
    }
    Ok(())
}
