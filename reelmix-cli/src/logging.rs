// ============================================================================
// reelmix-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Per-run log file naming and setup
//
// The CLI writes one log file per run through reelmix-core's log4rs setup.
// User-facing lines go through the reporter instead.

use log::LevelFilter;
use reelmix_core::CoreError;
use reelmix_core::file_logging::setup_file_logging;
use std::path::{Path, PathBuf};

use crate::error::CliResult;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of this run's log file inside `log_dir`.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("reelmix_run_{}.log", get_timestamp()))
}

pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the file logger and returns the log file path.
pub fn init_run_log(log_dir: &Path, verbose: bool) -> CliResult<PathBuf> {
    let path = run_log_path(log_dir);
    setup_file_logging(&path, level_for(verbose)).map_err(|e| {
        CoreError::PathError(format!(
            "Failed to set up log file '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(path)
}
