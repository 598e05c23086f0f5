//! Headless driver for the contagion field simulator.
//!
//! `contagion run` loads a field configuration, steps it either lockstep
//! (as fast as possible) or paced on a background thread, and prints a
//! summary. `contagion defaults` prints the default configuration as TOML.

mod runner;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::runner::RunOptions;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation and print a summary
    Run(RunArgs),
    /// Print the default configuration as TOML
    Defaults,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Field configuration file (TOML). Missing options use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 5_000)]
    ticks: u64,

    /// RNG seed, overriding the configuration file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable destination seeking
    #[arg(long)]
    destination: bool,

    /// Step on a paced background thread instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Tick rate for --realtime, in Hz
    #[arg(long, default_value_t = 100.0, requires = "realtime")]
    rate: f64,

    /// Stop as soon as the infection is eradicated
    #[arg(long)]
    until_eradicated: bool,

    /// Write the per-tick time series to this file as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<RunArgs> for RunOptions {
    fn from(args: RunArgs) -> Self {
        Self {
            config: args.config,
            ticks: args.ticks,
            seed: args.seed,
            destination: args.destination,
            realtime: args.realtime.then_some(args.rate),
            until_eradicated: args.until_eradicated,
            output: args.output,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => {
            let summary = runner::run(&args.into())?;
            println!("{summary}");
        }
        Command::Defaults => print!("{}", runner::default_config_toml()?),
    }
    Ok(())
}
