//! ---
//! dmi_section: "05-networking-external-interfaces"
//! dmi_subsection: "binary"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Control CLI invoking device methods."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dmi_common::{init_tracing, AppConfig, LogWriter};
use tracing::info;

mod invoke;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Device method invocation utility",
    long_about = None
)]
struct Cli {
    #[arg(
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Invoke a method on a device and print its lifecycle as JSON lines")]
    Invoke(invoke::InvokeArgs),
    #[command(about = "Print the effective configuration")]
    Config,
}

fn config_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("configs/dmi.toml"),
        PathBuf::from("dmi.toml"),
    ]
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let loaded = AppConfig::load_or_default(cli.config.as_deref(), &config_candidates())?;

    // stdout carries the JSON lines.
    let mut logging = loaded.config.logging.clone();
    logging.writer = LogWriter::Stderr;
    init_tracing("dmictl", &logging)?;
    match &loaded.source {
        Some(path) => info!(config = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using defaults"),
    }

    match cli.command {
        Commands::Invoke(args) => invoke::run(args, &loaded.config).await,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&loaded.config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
