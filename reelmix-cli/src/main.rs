// reelmix-cli/src/main.rs
//
// Entry point for the reelmix binary: parses arguments, dispatches to the
// command implementations and turns the outcome into an exit status.

use clap::Parser;
use console::style;
use reelmix_cli::error::exit_code;
use reelmix_cli::{Cli, Commands, run_mix, run_probe};
use std::process;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_mix(args).map(|_| ()),
        Commands::Probe(args) => run_probe(args),
    };

    if let Err(e) = result {
        if e.is_cancelled() {
            eprintln!("{}", style("Cancelled.").yellow().bold());
        } else {
            log::error!("Fatal: {}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
        }
        process::exit(exit_code(&e));
    }
}
