use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod report;

use commands::config::ConfigArgs;
use commands::run::RunArgs;

/// Dining philosophers around a table of shared utensils
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seat the philosophers and report their statistics
    Run(RunArgs),

    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::execute(&args),
        Commands::Config(args) => commands::config::execute(&args),
    }
}
