// ============================================================================
// reelmix-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// Every subprocess the pipeline starts goes through the `ToolRunner` trait.
// This module holds that seam, the command-line templates for each ffmpeg
// and ffprobe operation, the media probe built on them and binary path
// resolution.
//
// KEY COMPONENTS:
// - ToolRunner / ProcessRunner: supervised subprocess execution
// - ffmpeg: argument templates for cut, normalize, thumbnail and join commands
// - ffprobe: MediaProbe duration and dimension queries
// - ToolPaths / check_dependency: locating the binaries

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Argument templates for every ffmpeg invocation
pub mod ffmpeg;

/// Duration and dimension queries through ffprobe
pub mod ffprobe;

/// Supervised subprocess execution
pub mod tool_runner;

#[cfg(test)]
pub mod mocks;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffprobe::{MediaDimensions, MediaProbe};
pub use tool_runner::{ProcessRunner, ToolInvocation, ToolRunner};

// ============================================================================
// TOOL PATHS
// ============================================================================

/// Resolved locations of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Prefers binaries placed next to the current executable, then `PATH`.
    pub fn resolve() -> Self {
        Self {
            ffmpeg: ffmpeg_sidecar::paths::ffmpeg_path(),
            ffprobe: ffmpeg_sidecar::ffprobe::ffprobe_path(),
        }
    }

    /// Explicit locations, mostly for tests and custom installs.
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks that a required external command can be started.
///
/// Runs `<tool> -version` and only looks at whether the process started.
///
/// # Returns
///
/// * `Ok(())` - the command exists and is executable
/// * `Err(CoreError::DependencyNotFound)` - the command is not found
/// * `Err(CoreError::CommandStart)` - the command exists but fails to start
pub fn check_dependency(tool: &Path) -> CoreResult<()> {
    let name = tool.display().to_string();
    let result = Command::new(tool)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", name);
            Err(CoreError::DependencyNotFound(name))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", name, e);
            Err(CoreError::CommandStart {
                tool: name,
                source: e,
            })
        }
    }
}
