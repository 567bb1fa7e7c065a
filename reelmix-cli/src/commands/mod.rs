//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `run` command.
/// This command processes every video in the input folder in the selected mode.
pub mod run;

/// Module containing the implementation of the `probe` command.
pub mod probe;
