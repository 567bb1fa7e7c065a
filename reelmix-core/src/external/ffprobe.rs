//! Media probing through ffprobe.
//!
//! [`MediaProbe`] queries the container duration and the first video
//! stream's dimensions using plain-text ffprobe output formats, and parses
//! the result into typed values.

use std::path::Path;

use log::debug;

use super::ToolPaths;
use super::tool_runner::{ToolInvocation, ToolRunner};
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};

/// Width and height of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
}

impl MediaDimensions {
    /// Common encoders need both dimensions to be even.
    pub fn is_even(&self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }
}

/// ffprobe arguments printing only the container duration in seconds.
pub fn duration_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        "format=duration".to_string(),
        "-of".to_string(),
        "default=noprint_wrappers=1:nokey=1".to_string(),
        path.to_string_lossy().into_owned(),
    ]
}

/// ffprobe arguments printing `<width>x<height>` for the first video stream.
pub fn dimensions_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-show_entries".to_string(),
        "stream=width,height".to_string(),
        "-of".to_string(),
        "csv=s=x:p=0".to_string(),
        path.to_string_lossy().into_owned(),
    ]
}

/// Parses the duration output. Must be a finite, non-negative number.
pub fn parse_duration(output: &str) -> CoreResult<f64> {
    let text = output.trim();
    if text.is_empty() {
        return Err(CoreError::Probe("Could not read video duration.".to_string()));
    }
    match text.lines().next().map(str::trim).map(str::parse::<f64>) {
        Some(Ok(value)) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(CoreError::Probe(format!(
            "Could not read video duration from '{text}'"
        ))),
    }
}

/// Parses `<width>x<height>`.
pub fn parse_dimensions(output: &str) -> CoreResult<MediaDimensions> {
    let text = output.trim();
    let line = text.lines().next().unwrap_or_default().trim();
    let parsed = line.split_once('x').and_then(|(w, h)| {
        Some(MediaDimensions {
            width: w.trim().parse().ok()?,
            height: h.trim().parse().ok()?,
        })
    });
    parsed.ok_or_else(|| {
        CoreError::Probe(format!("Could not read video dimensions from '{text}'"))
    })
}

/// Duration and dimension queries routed through a [`ToolRunner`].
pub struct MediaProbe<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
}

impl<'a> MediaProbe<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolPaths) -> Self {
        Self { runner, tools }
    }

    pub fn duration(&self, path: &Path, ctx: &RunContext) -> CoreResult<f64> {
        let invocation = ToolInvocation::new("ffprobe", &self.tools.ffprobe, duration_args(path));
        let output = self.runner.run(&invocation, ctx)?;
        let duration = parse_duration(&output)?;
        debug!("Duration of {}: {:.3}s", path.display(), duration);
        Ok(duration)
    }

    pub fn dimensions(&self, path: &Path, ctx: &RunContext) -> CoreResult<MediaDimensions> {
        let invocation = ToolInvocation::new("ffprobe", &self.tools.ffprobe, dimensions_args(path));
        let output = self.runner.run(&invocation, ctx)?;
        let dims = parse_dimensions(&output)?;
        debug!("Dimensions of {}: {}x{}", path.display(), dims.width, dims.height);
        Ok(dims)
    }
}
