use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use layers::MapConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect authored POI map files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a POI file and print the normalized layout
    Inspect {
        file: PathBuf,

        /// Map config JSON (same shape as the web mount config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the waypoint string for one POI
    Waypoint { file: PathBuf, id: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Inspect { file, config, json } => {
            let config = match config {
                Some(path) => MapConfig::from_json(&read(&path)?).map_err(|e| e.to_string())?,
                None => MapConfig::default(),
            };
            let report = tools::inspect(&read(&file)?, &config).map_err(|e| e.to_string())?;
            info!(
                markers = report.markers.len(),
                diagnostics = report.diagnostics.len(),
                "inspected {file:?}"
            );
            if json {
                let payload =
                    serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
                println!("{payload}");
            } else {
                print!("{}", tools::render_text(&report));
            }
        }
        Command::Waypoint { file, id } => {
            let wp = tools::waypoint(&read(&file)?, &id).map_err(|e| e.to_string())?;
            match wp {
                Some(wp) => println!("{wp}"),
                None => return Err(format!("no POI with id {id:?}")),
            }
        }
    }
    Ok(())
}
