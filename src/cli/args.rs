// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fact extraction from typed program trees
#[derive(Parser)]
#[command(name = "quarry")]
#[command(version)]
#[command(about = "Lowers typed program trees into a relational fact base", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract one unit into fact tuples
    Extract {
        /// Path to the unit file (JSON produced by a front end)
        #[arg(value_name = "UNIT")]
        unit: PathBuf,
        /// Where to write the fact tuples; stdout if omitted
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the relation schema
    Relations,
}
