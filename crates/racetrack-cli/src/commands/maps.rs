//! Maps command handler for listing the map files in a folder.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use racetrack_lib::{list_maps, load_track};

use crate::output::OutputFormat;

/// One listed map file.
#[derive(Debug, Clone, Serialize)]
pub struct MapEntry {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub status: MapStatus,
}

/// Whether a listed map parsed successfully.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapStatus {
    Valid {
        width: usize,
        height: usize,
        starts: usize,
        finishes: usize,
    },
    Invalid {
        error: String,
    },
}

impl fmt::Display for MapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            MapStatus::Valid {
                width,
                height,
                starts,
                ..
            } => write!(
                f,
                "{} ({}x{}, {} start(s))",
                self.name, width, height, starts
            ),
            MapStatus::Invalid { error } => write!(f, "{} (invalid: {})", self.name, error),
        }
    }
}

/// Collect an entry for every `map*` file in `maps_dir`, sorted by name.
///
/// Files that fail to parse are still listed, flagged as invalid.
pub fn collect_maps(maps_dir: &Path) -> Result<Vec<MapEntry>> {
    let maps = list_maps(maps_dir)
        .with_context(|| format!("failed to list maps in {}", maps_dir.display()))?;

    let entries = maps
        .iter()
        .map(|path| {
            let status = match load_track(path) {
                Ok(track) => MapStatus::Valid {
                    width: track.width(),
                    height: track.height(),
                    starts: track.starts().len(),
                    finishes: track.finishes().len(),
                },
                Err(err) => {
                    tracing::warn!("invalid map {}: {}", path.display(), err);
                    MapStatus::Invalid {
                        error: err.to_string(),
                    }
                }
            };
            MapEntry {
                name: path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or_default()
                    .to_string(),
                path: path.display().to_string(),
                status,
            }
        })
        .collect();
    Ok(entries)
}

/// Handle the maps subcommand.
pub fn handle_maps(maps_dir: &Path, format: OutputFormat) -> Result<()> {
    let entries = collect_maps(maps_dir)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No maps found in {}", maps_dir.display());
        return Ok(());
    }
    if format == OutputFormat::Text {
        println!("Maps in {}:", maps_dir.display());
    }
    for entry in &entries {
        match format {
            OutputFormat::Basic => println!("{}", entry.name),
            _ => println!("- {entry}"),
        }
    }
    Ok(())
}
