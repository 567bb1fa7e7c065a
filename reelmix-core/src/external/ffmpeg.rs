//! FFmpeg command templates.
//!
//! Every ffmpeg operation the pipeline performs is a fixed argument template
//! with path and time parameters. Arguments are passed as a vector, never
//! through a shell, so paths need no quoting.

use std::path::Path;

use super::ToolPaths;
use super::tool_runner::ToolInvocation;

/// Re-encode parameters shared by every encoding command.
pub const ENCODE_ARGS: [&str; 10] = [
    "-c:v", "libx264", "-preset", "fast", "-crf", "23", "-c:a", "aac", "-b:a", "128k",
];

/// Filter that rounds both dimensions down to even values.
pub const EVEN_DIMENSIONS_FILTER: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2";

/// Filter producing the 32x32 grayscale fingerprint frame.
pub const THUMBNAIL_FILTER: &str = "scale=32:32:flags=bilinear,format=gray";

/// Formats seconds with up to three decimals and no trailing zeros.
#[must_use]
pub fn format_seconds(seconds: f64) -> String {
    let text = format!("{seconds:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Builder for ffmpeg argument lists with the common options used here.
pub struct FfmpegArgs {
    args: Vec<String>,
}

impl Default for FfmpegArgs {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegArgs {
    /// Starts an argument list that overwrites its output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            args: vec!["-y".to_string()],
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn pair(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    #[must_use]
    pub fn input(self, path: &Path) -> Self {
        self.pair("-i", path.to_string_lossy())
    }

    /// Appends the libx264/aac encode parameters.
    #[must_use]
    pub fn encode(mut self) -> Self {
        self.args.extend(ENCODE_ARGS.iter().map(|s| s.to_string()));
        self
    }

    /// Finishes the list with the output path.
    #[must_use]
    pub fn build(self, tools: &ToolPaths, output: &Path) -> ToolInvocation {
        let args = self.arg(output.to_string_lossy()).args;
        ToolInvocation::new("ffmpeg", &tools.ffmpeg, args).with_output(output)
    }
}

/// Stream-copy cut of `[start, start+length)`. Seeks before the input.
pub fn cut_copy(tools: &ToolPaths, input: &Path, start: f64, length: f64, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .pair("-ss", format_seconds(start))
        .pair("-t", format!("{length:.1}"))
        .input(input)
        .pair("-c", "copy")
        .build(tools, output)
}

/// Frame-accurate re-encoding cut of `[start, start+length)`.
pub fn cut_reencode(tools: &ToolPaths, input: &Path, start: f64, length: f64, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .input(input)
        .pair("-ss", format_seconds(start))
        .pair("-t", format!("{length:.1}"))
        .encode()
        .build(tools, output)
}

/// Picks the cut template for the configured split mode.
pub fn cut(tools: &ToolPaths, input: &Path, start: f64, length: f64, output: &Path, fast: bool) -> ToolInvocation {
    if fast {
        cut_copy(tools, input, start, length, output)
    } else {
        cut_reencode(tools, input, start, length, output)
    }
}

/// Re-encodes a source to even width and height.
pub fn normalize_dimensions(tools: &ToolPaths, input: &Path, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .input(input)
        .pair("-vf", EVEN_DIMENSIONS_FILTER)
        .encode()
        .build(tools, output)
}

/// Extracts the first frame as a 32x32 grayscale PNG.
pub fn thumbnail(tools: &ToolPaths, input: &Path, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .pair("-v", "error")
        .input(input)
        .pair("-vf", THUMBNAIL_FILTER)
        .pair("-frames:v", "1")
        .build(tools, output)
}

/// Zero re-encode join through the concat demuxer.
pub fn concat_copy(tools: &ToolPaths, list_file: &Path, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .pair("-f", "concat")
        .pair("-safe", "0")
        .input(list_file)
        .pair("-c", "copy")
        .build(tools, output)
}

/// Re-encoding join of the same concat list.
pub fn concat_reencode(tools: &ToolPaths, list_file: &Path, output: &Path) -> ToolInvocation {
    FfmpegArgs::new()
        .pair("-f", "concat")
        .pair("-safe", "0")
        .input(list_file)
        .encode()
        .build(tools, output)
}

/// Single-invocation crossfade join driven by a complete filter graph.
pub fn crossfade_join(
    tools: &ToolPaths,
    inputs: &[&Path],
    filter_graph: &str,
    video_label: &str,
    audio_label: &str,
    output: &Path,
) -> ToolInvocation {
    let mut args = FfmpegArgs::new();
    for input in inputs {
        args = args.input(input);
    }
    args.pair("-filter_complex", filter_graph)
        .pair("-map", video_label)
        .pair("-map", audio_label)
        .encode()
        .pair("-pix_fmt", "yuv420p")
        .pair("-movflags", "+faststart")
        .build(tools, output)
}
