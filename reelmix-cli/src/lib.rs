// reelmix-cli/src/lib.rs
//
// Library portion of the Reelmix CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod control;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, ModeArg, ProbeArgs, RunArgs};
pub use commands::probe::run_probe;
pub use commands::run::run_mix;
