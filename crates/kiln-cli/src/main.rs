//! Command-line interface for the Kiln analyser.

use anyhow::Result;
use clap::{Parser, Subcommand};
use kiln_cli::{commands, logging};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default kiln.toml in the current directory
    Init,

    /// List the canonical names a dotted class chain may denote
    #[command(visible_alias = "c")]
    Candidates {
        /// Fully qualified chain, e.g. java.util.Map.Entry
        chain: String,
    },

    /// Resolve fully qualified class chains against the classpath
    #[command(visible_alias = "r")]
    Resolve {
        /// Chains to resolve
        #[arg(required = true)]
        chains: Vec<String>,

        /// Extra class directories, searched after the configured ones
        #[arg(long = "classpath", short = 'c')]
        classpath: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Candidates { chain } => commands::candidates::execute(&chain),
        Commands::Resolve { chains, classpath } => commands::resolve::execute(&chains, classpath),
    }
}
