// src/bin/quarry.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use quarry::cli::{Cli, Commands};
use quarry::commands::extract::extract_unit;
use quarry::commands::relations::print_relations;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract { unit, output } => extract_unit(&unit, output.as_deref()),
        Commands::Relations => print_relations(),
    }
}
