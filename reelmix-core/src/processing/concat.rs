// ============================================================================
// reelmix-core/src/processing/concat.rs
// ============================================================================
//
// CONCATENATOR: Joining Segments into a Mix
//
// Two join strategies:
//
// CUT JOIN (default):
// 1. Write a concat-demuxer list naming every segment in order
// 2. Join with stream copy (no re-encode)
// 3. On failure, re-encode the same list once; a second failure is fatal
//
// CROSSFADE JOIN:
// Each adjacent pair overlaps by a short fade, built as one chained
// xfade/acrossfade filter graph so the whole mix is encoded in a single
// ffmpeg invocation. Offsets use each segment file's probed duration, not
// the planned cut length.

use std::io::Write;
use std::path::Path;

use log::{debug, info, warn};

use super::segmenter::Segment;
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::{self, format_seconds};
use crate::external::{MediaProbe, ToolPaths, ToolRunner};
use crate::reporting::Reporter;
use crate::temp_files::create_temp_file_in_system_dir;

/// Shortest crossfade in seconds.
pub const MIN_FADE_SECS: f64 = 0.05;

/// Longest crossfade in seconds.
pub const MAX_FADE_SECS: f64 = 0.5;

/// Fraction of the shorter neighbour used for the fade.
const FADE_FRACTION: f64 = 0.2;

/// Fade between two neighbours: 20% of the shorter one, clamped to
/// `[0.05, 0.5]` and rounded to two decimals.
pub fn fade_duration(previous_len: f64, next_len: f64) -> f64 {
    let raw = FADE_FRACTION * previous_len.min(next_len);
    let clamped = if raw.is_nan() {
        MIN_FADE_SECS
    } else {
        raw.clamp(MIN_FADE_SECS, MAX_FADE_SECS)
    };
    // Rounding cannot leave the clamp range: both bounds have two decimals
    (clamped * 100.0).round() / 100.0
}

/// A complete crossfade filter graph and its final output labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossfadeGraph {
    pub filter: String,
    pub video_label: String,
    pub audio_label: String,
}

/// Builds the chained transition graph for segments of the given lengths.
///
/// Returns `None` for fewer than two segments.
pub fn build_crossfade_graph(lengths: &[f64]) -> Option<CrossfadeGraph> {
    if lengths.len() < 2 {
        return None;
    }

    let mut filters = Vec::with_capacity((lengths.len() - 1) * 2);
    let mut running = lengths[0];

    for i in 1..lengths.len() {
        let fade = fade_duration(lengths[i - 1], lengths[i]);
        let offset = running - fade;
        let (video_in, audio_in) = if i == 1 {
            ("[0:v]".to_string(), "[0:a]".to_string())
        } else {
            (format!("[v{}]", i - 1), format!("[a{}]", i - 1))
        };

        filters.push(format!(
            "{video_in}[{i}:v]xfade=transition=fade:duration={}:offset={}[v{i}]",
            format_seconds(fade),
            format_seconds(offset)
        ));
        filters.push(format!(
            "{audio_in}[{i}:a]acrossfade=d={}[a{i}]",
            format_seconds(fade)
        ));
        running += lengths[i] - fade;
    }

    let last = lengths.len() - 1;
    Some(CrossfadeGraph {
        filter: filters.join(";"),
        video_label: format!("[v{last}]"),
        audio_label: format!("[a{last}]"),
    })
}

/// One concat-demuxer `file` directive with quotes and backslashes escaped.
pub fn concat_list_entry(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\'' => escaped.push_str("'\\''"),
            '\\' => escaped.push_str("'\\\\'"),
            other => escaped.push(other),
        }
    }
    format!("file '{escaped}'")
}

/// Joins `segments` in order into `output`.
///
/// A crossfade request with a single segment falls back to the cut join.
pub fn concat_segments(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    segments: &[&Segment],
    output: &Path,
    crossfade: bool,
    ctx: &RunContext,
    reporter: &dyn Reporter,
) -> CoreResult<()> {
    if segments.is_empty() {
        return Err(CoreError::InsufficientSegments(
            "Nothing to concatenate.".to_string(),
        ));
    }

    if crossfade && segments.len() > 1 {
        let probe = MediaProbe::new(runner, tools);
        let lengths = segments
            .iter()
            .map(|s| probe.duration(&s.path, ctx))
            .collect::<CoreResult<Vec<f64>>>()?;
        if let Some(graph) = build_crossfade_graph(&lengths) {
            debug!("Crossfade graph: {}", graph.filter);
            let inputs: Vec<&Path> = segments.iter().map(|s| s.path.as_path()).collect();
            let invocation = ffmpeg::crossfade_join(
                tools,
                &inputs,
                &graph.filter,
                &graph.video_label,
                &graph.audio_label,
                output,
            );
            runner.run(&invocation, ctx)?;
            info!("Crossfaded {} segments into {}", segments.len(), output.display());
            return Ok(());
        }
    } else if crossfade {
        debug!("Single segment, using cut join instead of crossfade");
    }

    let mut list_file = create_temp_file_in_system_dir("concat", "txt")?;
    for segment in segments {
        writeln!(list_file, "{}", concat_list_entry(&segment.path))?;
    }
    list_file.flush()?;

    let copy = ffmpeg::concat_copy(tools, list_file.path(), output);
    match runner.run(&copy, ctx) {
        Ok(_) => {}
        Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
        Err(e) => {
            let message = format!("Concat copy failed, re-encoding: {e}");
            warn!("{}", message);
            reporter.log_line(&message);
            let reencode = ffmpeg::concat_reencode(tools, list_file.path(), output);
            runner.run(&reencode, ctx)?;
        }
    }

    info!("Joined {} segments into {}", segments.len(), output.display());
    Ok(())
}
