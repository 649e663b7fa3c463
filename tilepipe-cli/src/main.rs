//! tilepipe CLI - drive the tile pipeline from a terminal.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;

#[derive(Debug, Parser)]
#[command(name = "tilepipe", version = tilepipe::VERSION)]
#[command(about = "Fetch map tiles through a cached provider chain", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.tilepipe/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a tile through the provider chain
    Fetch(FetchArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, config_path),
        Commands::Config(command) => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
