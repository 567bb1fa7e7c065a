//! Small helpers shared across the pipeline.
//!
//! Duration formatting for progress lines, the per-file timestamp token and
//! moving finished sources out of the input folder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};

use crate::error::{CoreError, CoreResult};

const UNKNOWN_CLOCK: &str = "--:--:--";

/// Clock-style `HH:MM:SS` for a length in seconds (3725.0 gives "01:02:05").
///
/// Negative or non-finite input renders as `--:--:--`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if !(seconds.is_finite() && seconds >= 0.0) {
        return UNKNOWN_CLOCK.to_owned();
    }
    let whole = seconds.trunc() as u64;
    format!("{:02}:{:02}:{:02}", whole / 3600, whole / 60 % 60, whole % 60)
}

/// Formats a remaining-time estimate as `{m}m {ss}s` (e.g., 125s -> "2m 05s").
#[must_use]
pub fn format_eta(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}m {:02}s", total / 60, total % 60)
}

/// Local-time token `YYYYMMDD_HHMM` stamped into every file produced for one source.
#[must_use]
pub fn file_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M").to_string()
}

/// File name of `path` as an owned string.
pub fn get_filename_safe(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_name()
        .ok_or_else(|| {
            CoreError::PathError(format!("Failed to get filename for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Extracts the file stem (name without extension).
pub fn get_file_stem(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| {
            CoreError::PathError(format!("Failed to get file stem for {}", path.display()))
        })?
        .to_string_lossy()
        .to_string())
}

/// Moves `source` into `processed_dir`, replacing any file with the same name.
///
/// Falls back to copy + delete when a plain rename is not possible (e.g. the
/// folders are on different devices).
pub fn move_to_processed(source: &Path, processed_dir: &Path) -> CoreResult<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        CoreError::PathError(format!("Failed to get filename for {}", source.display()))
    })?;
    fs::create_dir_all(processed_dir)?;
    let target = processed_dir.join(file_name);

    if target.exists() {
        debug!("Replacing existing processed file {}", target.display());
        fs::remove_file(&target)?;
    }

    if let Err(e) = fs::rename(source, &target) {
        warn!(
            "Rename of {} failed ({}), copying instead",
            source.display(),
            e
        );
        fs::copy(source, &target)?;
        fs::remove_file(source)?;
    }

    debug!("Moved {} to {}", source.display(), target.display());
    Ok(target)
}
