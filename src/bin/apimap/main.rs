//! apimap CLI - resolve third-party API calls to exported functions

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("apimap=debug")
    } else {
        EnvFilter::new("apimap=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = cli::GlobalArgs {
        verbose: cli.verbose,
        config: cli.config,
    };

    match cli.command {
        Commands::Index(args) => commands::index::execute(args),
        Commands::Modules(args) => commands::modules::execute(args),
        Commands::Configs(args) => commands::configs::execute(args),
        Commands::Resolve(args) => commands::resolve::execute(args, &global),
        Commands::Filter(args) => commands::filter::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
