mod cli;
mod commands;
mod extract;
mod model;
mod profile;
mod scripture;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

const LOG_ENV: &str = "WESTMINSTER_LOG";
const DEFAULT_LOG_FILTER: &str = "info,lopdf=warn,reqwest=warn";

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Convert(args) => commands::convert::run(args),
        Commands::Bind(args) => commands::bind::run(args),
        Commands::Scripture(args) => commands::scripture::run(args),
        Commands::Verify(args) => commands::verify::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
