use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use racetrack_cli::commands::maps::handle_maps;
use racetrack_cli::commands::race::{handle_race, AlgorithmArg, RaceCommandArgs};
use racetrack_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Vector racetrack route planner")]
struct Cli {
    /// Folder searched for map files referenced by name.
    #[arg(long, global = true, default_value = "docs/maps")]
    maps_dir: PathBuf,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the map files in the maps folder.
    Maps,
    /// Plan a race on a map.
    Race {
        /// Map name (e.g. `map_hairpin`) or path to a map file.
        #[arg(long)]
        map: String,
        /// Search algorithm used for every car.
        #[arg(long, value_enum, default_value_t = AlgorithmArg::AStar)]
        algorithm: AlgorithmArg,
        /// Number of cars to race; defaults to one per start cell.
        #[arg(long)]
        cars: Option<usize>,
        /// Include raw state-space nodes in the output.
        #[arg(long)]
        show_nodes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Maps => handle_maps(&cli.maps_dir, cli.format),
        Command::Race {
            map,
            algorithm,
            cars,
            show_nodes,
        } => {
            let args = RaceCommandArgs {
                map,
                algorithm,
                cars,
                format: cli.format,
                show_nodes,
            };
            handle_race(&cli.maps_dir, &args).await
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
