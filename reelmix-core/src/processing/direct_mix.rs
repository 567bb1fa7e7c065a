//! Direct-mix mode: one clip per time bucket, cut straight into each mix.
//!
//! The source duration is split into `K` equal time buckets. For every
//! requested output, one clip of random length is cut from a random offset
//! inside each bucket, the clips are joined and then deleted. The full
//! segment set of the source is never materialized.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;

use super::concat::concat_segments;
use super::segmenter::{Segment, next_segment_length};
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};
use crate::external::{ToolPaths, ToolRunner, ffmpeg};
use crate::reporting::Reporter;

const TOO_SHORT: &str = "Video is too short for the selected min seconds.";

/// Contiguous time window `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBucket {
    pub start: f64,
    pub length: f64,
}

/// Splits `total` seconds into `count` equal buckets.
pub fn build_time_buckets(total: f64, count: usize) -> Vec<TimeBucket> {
    let count_f = count as f64;
    (0..count)
        .map(|i| {
            let start = total * i as f64 / count_f;
            let end = total * (i + 1) as f64 / count_f;
            TimeBucket {
                start,
                length: (end - start).max(0.0),
            }
        })
        .collect()
}

/// Draws a clip length for `bucket`, truncated to the whole seconds available.
///
/// Fails with `InsufficientDuration` when even the truncated length is below `min`.
pub fn clip_length<R: Rng + ?Sized>(
    rng: &mut R,
    bucket: &TimeBucket,
    min: u32,
    max: u32,
) -> CoreResult<f64> {
    let mut length = next_segment_length(rng, min, max);
    if length > bucket.length {
        length = bucket.length.floor();
    }
    if length < f64::from(min) {
        return Err(CoreError::InsufficientDuration(TOO_SHORT.to_string()));
    }
    Ok(length)
}

/// Random start such that `[start, start + length)` stays inside `bucket`.
pub fn clip_start<R: Rng + ?Sized>(rng: &mut R, bucket: &TimeBucket, length: f64) -> f64 {
    let slack = bucket.length - length;
    if slack <= 0.0 {
        bucket.start
    } else {
        bucket.start + rng.gen_range(0.0..1.0) * slack
    }
}

/// Inputs of one direct-mix run over a single source.
pub struct DirectMixRequest<'a> {
    pub input: &'a Path,
    pub base_name: &'a str,
    pub timestamp: &'a str,
    pub total: f64,
    pub min_secs: u32,
    pub max_secs: u32,
    pub segments_per_output: usize,
    pub outputs_per_input: usize,
    pub fast_split: bool,
    pub crossfade: bool,
    /// Scratch folder for the clips (`output/_direct/<name>`)
    pub work_dir: &'a Path,
    pub output_dir: &'a Path,
}

/// Produces every mix for one source. Returns the written mix paths.
pub fn direct_mix<R: Rng + ?Sized>(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    request: &DirectMixRequest<'_>,
    ctx: &RunContext,
    rng: &mut R,
    reporter: &dyn Reporter,
) -> CoreResult<Vec<PathBuf>> {
    let buckets = build_time_buckets(request.total, request.segments_per_output);
    if buckets
        .iter()
        .any(|b| b.length < f64::from(request.min_secs))
    {
        return Err(CoreError::InsufficientDuration(TOO_SHORT.to_string()));
    }

    let outputs = request.outputs_per_input;
    let mut written = Vec::with_capacity(outputs);

    for out_idx in 0..outputs {
        ctx.checkpoint()?;
        reporter.log_line(&format!("Creating video {}/{}...", out_idx + 1, outputs));

        let mut clips = Vec::with_capacity(buckets.len());
        for (i, bucket) in buckets.iter().enumerate() {
            let length = clip_length(rng, bucket, request.min_secs, request.max_secs)?;
            let start = clip_start(rng, bucket, length);
            let path = request.work_dir.join(format!(
                "scene_{}_{}_{}.mp4",
                i + 1,
                out_idx,
                request.timestamp
            ));
            debug!(
                "Bucket {}: clip {:.2}s at {:.2}s -> {}",
                i + 1,
                length,
                start,
                path.display()
            );
            let invocation = ffmpeg::cut(
                tools,
                request.input,
                start,
                length,
                &path,
                request.fast_split,
            );
            runner.run(&invocation, ctx)?;
            clips.push(Segment {
                path,
                start,
                length,
                index: i,
            });
        }

        let output = request.output_dir.join(format!(
            "{}_mix_{}_{}.mp4",
            request.base_name, out_idx, request.timestamp
        ));
        reporter.log_line(&format!("Mixing segments for video {}/{}...", out_idx + 1, outputs));
        let refs: Vec<&Segment> = clips.iter().collect();
        concat_segments(runner, tools, &refs, &output, request.crossfade, ctx, reporter)?;

        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        reporter.log_line(&format!("Completed video {}/{}: {}", out_idx + 1, outputs, name));
        info!("Direct mix {} written to {}", out_idx, output.display());

        for clip in &clips {
            if let Err(e) = fs::remove_file(&clip.path) {
                debug!("Could not delete clip {}: {}", clip.path.display(), e);
            }
        }
        written.push(output);
    }

    Ok(written)
}
