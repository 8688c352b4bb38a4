//! Command-line driver for the board diff applier.
//!
//! # Responsibility
//! - Apply diff files to a shadow model without a running host.
//! - Keep exit codes stable: 0 on success, 1 on failure.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "pcbsync")]
#[command(about = "Apply board diffs to a shadow model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply one or more diff files to a shadow model
    Apply(commands::apply::ApplyArgs),
    /// Print the core version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply(args) => commands::apply::execute(args),
        Commands::Version => {
            println!("pcbsync_core version={}", pcbsync_core::core_version());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
