//! Persisted settings for the reelmix front-end.
//!
//! Settings are a pretty-printed JSON rendering of [`MixConfig`]. Loading is
//! forgiving: a missing file yields the defaults silently and an unreadable
//! or corrupt file yields the defaults with a warning, so a damaged settings
//! file never blocks a run.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::config::MixConfig;
use crate::error::CoreResult;

/// Loads settings from `path`, falling back to [`MixConfig::default`].
pub fn load_settings(path: &Path) -> MixConfig {
    if !path.exists() {
        debug!("No settings file at {}, using defaults", path.display());
        return MixConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read settings file {}: {}", path.display(), e);
            return MixConfig::default();
        }
    };

    match serde_json::from_str::<MixConfig>(&contents) {
        Ok(config) => {
            debug!("Loaded settings from {}", path.display());
            config
        }
        Err(e) => {
            warn!(
                "Settings file {} is corrupt ({}), using defaults",
                path.display(),
                e
            );
            MixConfig::default()
        }
    }
}

/// Writes `config` to `path` as pretty JSON, creating parent directories.
pub fn save_settings(path: &Path, config: &MixConfig) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    debug!("Saved settings to {}", path.display());
    Ok(())
}
