//! MAAT CLI - drive the bicameral pair and the recursive loop from a terminal
//!
//! - `maat demo` runs one hemisphere pair over the synthetic feed
//! - `maat reactor` runs the inner/outer loop under the governor
//! - `maat config` prints the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

/// MAAT CLI application
#[derive(Parser)]
#[command(name = "maat")]
#[command(
    about = "MAAT - bicameral hypothesis gating with a SCRAM-guarded loop",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, env = "MAAT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single hemisphere pair over the synthetic feed
    Demo(commands::demo::DemoArgs),

    /// Run the recursive inner/outer loop
    Reactor(commands::reactor::ReactorArgs),

    /// Print the effective configuration as TOML
    Config {
        /// Start from the stress preset
        #[arg(long)]
        stress: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Demo(args) => {
            let config = config::load(config_path, false)?;
            commands::demo::execute(args, config)
        }
        Commands::Reactor(args) => {
            let config = config::load(config_path, args.stress)?;
            commands::reactor::execute(args, config)
        }
        Commands::Config { stress } => {
            let config = config::load(config_path, stress)?;
            print!("{}", config::to_toml(&config)?);
            Ok(())
        }
    }
}
