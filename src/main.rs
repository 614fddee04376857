mod ask;
mod cli;
mod config;
mod document;
mod gen;
mod git;
mod ignore;
mod logger;
mod structure;
mod transport;
mod updater;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Gen(args) => gen::run(args),
        Commands::Ask(args) => ask::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
