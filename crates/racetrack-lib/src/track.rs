//! Track grids and the plain-text map format.
//!
//! A map is a block of rows made of four characters:
//!
//! | char | cell            |
//! |------|-----------------|
//! | `X`  | outside track   |
//! | `-`  | track           |
//! | `P`  | start (one car) |
//! | `F`  | finish          |
//!
//! Whitespace inside a row is ignored and blank lines are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::car::Coordinates;
use crate::error::{Error, Result};

/// Maps are discovered in a folder by this file-name prefix.
pub const MAP_FILE_PREFIX: &str = "map";

/// Kind of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Track,
    OutsideTrack,
    Start,
    Finish,
}

impl CellKind {
    /// Track, start and finish cells are drivable; only walls are not.
    pub fn is_inside_track(self) -> bool {
        !matches!(self, CellKind::OutsideTrack)
    }

    pub fn from_char(ch: char) -> Option<CellKind> {
        match ch {
            'X' => Some(CellKind::OutsideTrack),
            '-' => Some(CellKind::Track),
            'P' => Some(CellKind::Start),
            'F' => Some(CellKind::Finish),
            _ => None,
        }
    }
}

/// A validated, rectangular track grid with its start and finish cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    cells: Vec<Vec<CellKind>>,
    starts: Vec<Coordinates>,
    finishes: Vec<Coordinates>,
}

impl Track {
    /// Validate and assemble a track. `cells` is indexed `[row][col]`; start and
    /// finish coordinates are `(col, row)`.
    pub fn new(
        cells: Vec<Vec<CellKind>>,
        starts: Vec<Coordinates>,
        finishes: Vec<Coordinates>,
    ) -> Result<Self> {
        let expected = match cells.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(Error::EmptyTrack),
        };
        for (row, cells_in_row) in cells.iter().enumerate() {
            if cells_in_row.len() != expected {
                return Err(Error::RaggedTrack {
                    row,
                    expected,
                    found: cells_in_row.len(),
                });
            }
        }
        if starts.is_empty() {
            return Err(Error::EmptyStartList);
        }
        if finishes.is_empty() {
            return Err(Error::EmptyFinishList);
        }

        let track = Self {
            cells,
            starts,
            finishes,
        };
        track.check_in_track("start", &track.starts)?;
        track.check_in_track("finish", &track.finishes)?;
        Ok(track)
    }

    fn check_in_track(&self, role: &'static str, coords: &[Coordinates]) -> Result<()> {
        for &coord in coords {
            match self.cell(coord) {
                Some(kind) if kind.is_inside_track() => {}
                _ => {
                    return Err(Error::CellOutsideTrack {
                        role,
                        x: coord.x,
                        y: coord.y,
                    })
                }
            }
        }
        Ok(())
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cells[0].len()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn starts(&self) -> &[Coordinates] {
        &self.starts
    }

    pub fn finishes(&self) -> &[Coordinates] {
        &self.finishes
    }

    /// Cell at `pos`, or `None` when `pos` lies outside the grid.
    pub fn cell(&self, pos: Coordinates) -> Option<CellKind> {
        let row = usize::try_from(pos.y).ok()?;
        let col = usize::try_from(pos.x).ok()?;
        self.cells.get(row)?.get(col).copied()
    }
}

/// Parse a map from its text representation.
pub fn parse_track(text: &str) -> Result<Track> {
    let mut cells = Vec::new();
    let mut starts = Vec::new();
    let mut finishes = Vec::new();

    for line in text.lines() {
        let stripped: Vec<char> = line.chars().filter(|ch| !ch.is_whitespace()).collect();
        if stripped.is_empty() {
            continue;
        }

        let row = cells.len();
        let mut parsed = Vec::with_capacity(stripped.len());
        for (col, ch) in stripped.into_iter().enumerate() {
            let kind = CellKind::from_char(ch).ok_or(Error::InvalidMapChar { ch, row, col })?;
            let coord = Coordinates::new(col as i32, row as i32);
            match kind {
                CellKind::Start => starts.push(coord),
                CellKind::Finish => finishes.push(coord),
                CellKind::Track | CellKind::OutsideTrack => {}
            }
            parsed.push(kind);
        }
        cells.push(parsed);
    }

    Track::new(cells, starts, finishes)
}

/// Read and parse a map file.
pub fn load_track(path: &Path) -> Result<Track> {
    if !path.is_file() {
        return Err(Error::MapNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    let track = parse_track(&text)?;
    tracing::debug!(
        "loaded {}x{} track from {} ({} starts, {} finishes)",
        track.width(),
        track.height(),
        path.display(),
        track.starts().len(),
        track.finishes().len()
    );
    Ok(track)
}

/// List map files (names starting with `map`) in `dir`, sorted by name.
pub fn list_maps(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MapNotFound {
            path: dir.to_path_buf(),
        });
    }
    let mut maps = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_map = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(MAP_FILE_PREFIX));
        if is_map && path.is_file() {
            maps.push(path);
        }
    }
    maps.sort();
    Ok(maps)
}

/// Resolve a map reference to a file path.
///
/// `reference` may be a path to an existing file, a file name inside `dir`, or a
/// file stem (`map_a` for `map_a.txt`). Unknown names produce fuzzy suggestions.
pub fn resolve_map(dir: &Path, reference: &str) -> Result<PathBuf> {
    let direct = PathBuf::from(reference);
    if direct.is_file() {
        return Ok(direct);
    }

    let maps = list_maps(dir)?;
    let found = maps.iter().find(|path| {
        path.file_name().and_then(|n| n.to_str()) == Some(reference)
            || path.file_stem().and_then(|n| n.to_str()) == Some(reference)
    });
    if let Some(path) = found {
        return Ok(path.clone());
    }

    let stems: Vec<String> = maps
        .iter()
        .filter_map(|path| path.file_stem().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    Err(Error::UnknownMap {
        name: reference.to_string(),
        suggestions: fuzzy_matches(reference, &stems, 3),
    })
}

/// Names similar to `query`, closest first.
fn fuzzy_matches(query: &str, candidates: &[String], limit: usize) -> Vec<String> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, &String)> = candidates
        .iter()
        .map(|name| (strsim::jaro_winkler(&query, &name.to_lowercase()), name))
        .filter(|(score, _)| *score >= 0.7)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.clone())
        .collect()
}
