#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line tools for the barangay hotspot map.
//!
//! Renders a month's map to the static directory without starting the
//! server, lists the registered months, summarizes the location table, or
//! starts the server. Paths default to the same environment variables the
//! server reads and can be overridden per invocation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hotspot_map_dataset::Dataset;
use hotspot_map_server::{ServerConfig, load_state, render_month, run_server};

#[derive(Parser)]
#[command(name = "hotspot_map", about = "Barangay hotspot map tools")]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Location table CSV (overrides `HOTSPOT_DATA_PATH`)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Exported model JSON (overrides `HOTSPOT_MODEL_PATH`)
    #[arg(long, global = true)]
    model: Option<PathBuf>,
    /// Static asset directory (overrides `HOTSPOT_STATIC_DIR`)
    #[arg(long, global = true)]
    static_dir: Option<PathBuf>,
    /// Classification config TOML (overrides `HOTSPOT_CONFIG_PATH`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one month's map into the static directory
    Render {
        /// Month name (e.g. `June`, `December`)
        #[arg(long)]
        month: String,
    },
    /// List the selectable months
    Months,
    /// Summarize the location table
    Inspect,
    /// Start the web server
    Serve,
}

impl PathArgs {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(data) = self.data {
            config.data_path = data;
        }
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
        if self.config.is_some() {
            config.config_path = self.config;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let config = cli.paths.apply(ServerConfig::from_env());

    match cli.command {
        Commands::Render { month } => {
            let state = load_state(&config)?;
            let rendered = render_month(&state.analyzer, &state.static_dir, &state.view, &month)?;
            println!(
                "{}: {} markers -> {}",
                rendered.month,
                rendered.markers.len(),
                rendered.artifact.path.display()
            );
        }
        Commands::Months => {
            for month in hotspot_map_analysis::registry::all_months() {
                let kind = if month.is_predicted() {
                    "predicted"
                } else {
                    "historical"
                };
                println!("{:>2}. {} ({kind})", month.order, month.name);
            }
        }
        Commands::Inspect => {
            let dataset = Dataset::load(&config.data_path)?;
            println!("{} locations", dataset.len());
            for column in dataset.columns() {
                match dataset.column(column) {
                    Ok(values) => {
                        let missing = values.iter().filter(|v| v.is_none()).count();
                        println!("  {column} ({missing} missing)");
                    }
                    Err(_) => println!("  {column} (text)"),
                }
            }
        }
        Commands::Serve => {
            actix_web::rt::System::new().block_on(run_server(config))?;
        }
    }

    Ok(())
}
