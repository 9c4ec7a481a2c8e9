//! Output formatting for race rendering.
//!
//! Text output is colored when the terminal allows it. The basic format
//! reuses the library's renderer, and JSON serialises the summary as-is.

use std::fmt::Write as _;
use std::io::{self, Write};

use clap::ValueEnum;
use racetrack_lib::{CarRoute, RaceSummary};

use crate::terminal::{format_with_separators, ColorPalette};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary with one block per car.
    #[default]
    Text,
    /// One board path per line.
    Basic,
    /// Pretty-printed JSON.
    Json,
}

/// Render `summary` to standard output in the chosen format.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render(summary: &RaceSummary, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", render_text(summary, &ColorPalette::detect()));
            Ok(())
        }
        OutputFormat::Basic => {
            print!("{}", summary.render_basic());
            Ok(())
        }
        OutputFormat::Json => render_json(summary),
    }
}

/// Render a race summary as colored text.
pub fn render_text(summary: &RaceSummary, palette: &ColorPalette) -> String {
    let p = palette;
    let mut buffer = String::new();
    let _ = writeln!(
        buffer,
        "Race on {}{}{} ({} car(s); algorithm: {})",
        p.white_bold,
        summary.map.as_deref().unwrap_or("<unnamed>"),
        p.reset,
        summary.cars.len(),
        summary.algorithm
    );
    let _ = writeln!(
        buffer,
        "{}State space: {} nodes, {} edges{}",
        p.gray,
        format_with_separators(summary.graph_nodes as u64),
        format_with_separators(summary.graph_edges as u64),
        p.reset
    );

    for car in &summary.cars {
        buffer.push('\n');
        render_car(&mut buffer, car, p);
    }

    let _ = writeln!(
        buffer,
        "\nTotal cost: {}{}{}",
        p.cyan, summary.total_cost, p.reset
    );
    buffer
}

fn render_car(buffer: &mut String, car: &CarRoute, p: &ColorPalette) {
    let crashes = if car.crashes > 0 {
        format!(", {}{} crash(es){}", p.red, car.crashes, p.reset)
    } else {
        String::new()
    };
    let _ = writeln!(
        buffer,
        "{}Car {}{}: {} moves, cost {}{}{}{}",
        p.white_bold,
        car.car + 1,
        p.reset,
        car.moves,
        p.cyan,
        car.cost,
        p.reset,
        crashes
    );

    let last = car.board_path.len().saturating_sub(1);
    for (index, cell) in car.board_path.iter().enumerate() {
        let tag = match index {
            0 => format!(" {}STRT{}", p.tag_start, p.reset),
            i if i == last && car.finished => format!(" {}FNSH{}", p.tag_finish, p.reset),
            _ => String::new(),
        };
        let _ = writeln!(buffer, "  {:>3}. {}{}", index, cell, tag);
    }

    if let Some(nodes) = &car.nodes {
        for (index, node) in nodes.iter().enumerate() {
            let _ = writeln!(buffer, "  {}{:>3}: {}{}", p.gray, index, node, p.reset);
        }
    }
}

/// Render a race summary in JSON format.
///
/// # Errors
///
/// Returns an error if JSON serialization or writing fails.
pub fn render_json(summary: &RaceSummary) -> io::Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, summary).map_err(io::Error::other)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Print the footer with elapsed time.
pub fn print_footer(elapsed: std::time::Duration, palette: &ColorPalette) {
    let elapsed_ms = elapsed.as_millis();
    let time_str = if elapsed_ms < 1000 {
        format!("{}ms", elapsed_ms)
    } else {
        format!("{:.2}s", elapsed.as_secs_f64())
    };
    println!("\n{}Completed in {}{}", palette.gray, time_str, palette.reset);
}
