//! Run log written through log4rs.
//!
//! The `log` macros used across the pipeline end up in a single file per
//! run. Terminal output is the reporter's job, so nothing is sent to stdout.

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::fs;
use std::path::Path;

pub const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

const APPENDER: &str = "run_log";

/// Crates whose chatter is capped at `Warn` regardless of the run level.
const QUIET_TARGETS: &[&str] = &["ffmpeg_sidecar"];

/// Builds the log4rs config for `log_file`, truncating any previous content.
pub fn build_log_config(log_file: &Path, level: LevelFilter) -> Result<Config> {
    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log folder {}", dir.display()))?;
    }

    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .append(false)
        .build(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;

    let mut builder =
        Config::builder().appender(Appender::builder().build(APPENDER, Box::new(appender)));
    for target in QUIET_TARGETS {
        builder = builder.logger(Logger::builder().build(*target, level.min(LevelFilter::Warn)));
    }

    builder
        .build(Root::builder().appender(APPENDER).build(level))
        .context("building log configuration")
}

/// Installs the run log as the global logger. Only the first call in a process succeeds.
pub fn setup_file_logging(log_file: &Path, log_level: LevelFilter) -> Result<()> {
    let config = build_log_config(log_file, log_level)?;
    log4rs::init_config(config).context("installing the run logger")?;
    Ok(())
}
