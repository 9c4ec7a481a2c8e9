use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the racetrack library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Map file could not be located at the resolved path.
    #[error("map not found at {path}")]
    MapNotFound { path: PathBuf },

    /// Raised when a map name could not be resolved inside the maps folder.
    #[error("unknown map '{name}'{}", format_suggestions(.suggestions))]
    UnknownMap {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a map file contains a character outside the `X`, `-`, `P`, `F` alphabet.
    #[error("invalid map character '{ch}' at row {row}, column {col}")]
    InvalidMapChar { ch: char, row: usize, col: usize },

    /// Raised when the track grid has no cells.
    #[error("track grid is empty")]
    EmptyTrack,

    /// Raised when the rows of the track grid differ in length.
    #[error("track row {row} has {found} cells, expected {expected}")]
    RaggedTrack {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Raised when no start cell is available to seed the state-space search.
    #[error("track has no start cells")]
    EmptyStartList,

    /// Raised when no finish cell is available as a search target.
    #[error("track has no finish cells")]
    EmptyFinishList,

    /// Raised when a start or finish coordinate does not reference an in-track cell.
    #[error("{role} coordinate ({x},{y}) is not an in-track cell of the grid")]
    CellOutsideTrack { role: &'static str, x: i32, y: i32 },

    /// Raised when the requested number of cars cannot be placed on the track.
    #[error("cannot race {requested} car(s) on a track with {available} start cell(s)")]
    InvalidCarCount { requested: usize, available: usize },

    /// Raised when no route to any finish cell could be found for a car.
    #[error("no route found to a finish cell for car {car}")]
    RouteNotFound { car: usize },

    /// Raised when an algorithm name cannot be parsed.
    #[error("unknown algorithm '{name}'; expected one of dfs, bfs, greedy, a-star")]
    UnknownAlgorithm { name: String },

    /// Raised when a background race worker stopped before reporting a result.
    #[error("race worker stopped before reporting a result")]
    WorkerStopped,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
