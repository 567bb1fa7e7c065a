//! Error types for the reelmix-core library.
//!
//! Every failure in the pipeline is expressed as a [`CoreError`]. The
//! orchestrator distinguishes exactly one batch-fatal kind,
//! [`CoreError::Cancelled`], from all the per-file kinds, which are caught at
//! the per-file boundary and leave the source file in the input folder.

use std::fmt::Display;
use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Custom error types for reelmix-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input folder is missing or unreadable. Fatal before any file is touched.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Duration or dimensions could not be read from the prober output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// An external tool exited with a non-zero status and error output.
    #[error("{tool} failed: {message}")]
    ToolFailure { tool: String, message: String },

    /// The external tool could not be started at all.
    #[error("Failed to start {tool}: {source}")]
    CommandStart {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("Required dependency '{0}' not found")]
    DependencyNotFound(String),

    /// Not enough segments for the requested mix shape.
    #[error("{0}")]
    InsufficientSegments(String),

    /// The source is too short for the requested mix shape.
    #[error("{0}")]
    InsufficientDuration(String),

    /// The run was cancelled. Propagates through the whole batch.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl CoreError {
    /// Returns true for the only error kind allowed to unwind the batch.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

/// Result type for reelmix-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds a [`CoreError::ToolFailure`] from a finished process.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Display,
) -> CoreError {
    let tool = tool.into();
    let stderr = stderr.to_string();
    let message = if stderr.trim().is_empty() {
        format!("exited with {status}")
    } else {
        stderr.trim().to_string()
    };
    CoreError::ToolFailure { tool, message }
}

/// Builds a [`CoreError::CommandStart`], folding "not found" into
/// [`CoreError::DependencyNotFound`].
pub fn command_start_error(tool: impl Into<String>, source: io::Error) -> CoreError {
    let tool = tool.into();
    if source.kind() == io::ErrorKind::NotFound {
        CoreError::DependencyNotFound(tool)
    } else {
        CoreError::CommandStart { tool, source }
    }
}
