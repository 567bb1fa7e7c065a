//! Randomized sequential segmentation.
//!
//! A source of `total` seconds is covered from the start by segments whose
//! lengths are drawn uniformly from `[min, max]` and rounded to 0.1s. A
//! segment that would overrun the end is truncated to the whole seconds
//! left, and any trailing remainder shorter than `min` is discarded.

use std::path::{Path, PathBuf};

use log::debug;
use rand::Rng;

use crate::context::RunContext;
use crate::error::CoreResult;
use crate::external::{ToolPaths, ToolRunner, ffmpeg};
use crate::reporting::Reporter;

/// A clip cut from a source video.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub path: PathBuf,
    pub start: f64,
    pub length: f64,
    /// 0-based position in the order the segments were cut.
    pub index: usize,
}

/// Draws one segment length in `[min, max]`, rounded to the nearest 0.1s.
pub fn next_segment_length<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> f64 {
    if min >= max {
        return f64::from(min);
    }
    let (min, max) = (f64::from(min), f64::from(max));
    let value = min + (max - min) * rng.gen_range(0.0..1.0);
    let rounded = (value * 10.0).round() / 10.0;
    rounded.clamp(min, max)
}

/// One planned cut, before extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedCut {
    pub index: usize,
    pub start: f64,
    pub length: f64,
}

/// Lazily plans the cuts covering `[0, total)`.
///
/// Lengths are drawn only when the next cut is requested, so interleaving
/// extraction with planning consumes the generator in the same order.
pub struct SegmentPlanner<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    total: f64,
    min: u32,
    max: u32,
    current: f64,
    index: usize,
    done: bool,
}

impl<'r, R: Rng + ?Sized> SegmentPlanner<'r, R> {
    pub fn new(rng: &'r mut R, total: f64, min: u32, max: u32) -> Self {
        Self {
            rng,
            total,
            min,
            max,
            current: 0.0,
            index: 0,
            done: false,
        }
    }
}

impl<R: Rng + ?Sized> Iterator for SegmentPlanner<'_, R> {
    type Item = PlannedCut;

    fn next(&mut self) -> Option<PlannedCut> {
        if self.done || self.current >= self.total {
            self.done = true;
            return None;
        }

        let mut length = next_segment_length(&mut *self.rng, self.min, self.max);
        if self.current + length > self.total {
            length = (self.total - self.current).floor();
        }
        if length < f64::from(self.min) {
            self.done = true;
            return None;
        }

        let cut = PlannedCut {
            index: self.index,
            start: self.current,
            length,
        };
        self.current += length;
        self.index += 1;
        Some(cut)
    }
}

/// Everything needed to cut one source into segments.
pub struct SplitRequest<'a> {
    pub input: &'a Path,
    pub total: f64,
    pub min_secs: u32,
    pub max_secs: u32,
    pub fast_split: bool,
}

/// Cuts `request.input` into segments named by `name_for` (given the 1-based number).
///
/// Waits on the pause gate before every cut.
pub fn split_video<R, F>(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    request: &SplitRequest<'_>,
    name_for: F,
    ctx: &RunContext,
    rng: &mut R,
    reporter: &dyn Reporter,
) -> CoreResult<Vec<Segment>>
where
    R: Rng + ?Sized,
    F: Fn(usize) -> PathBuf,
{
    let mut segments = Vec::new();
    let planner = SegmentPlanner::new(rng, request.total, request.min_secs, request.max_secs);

    for cut in planner {
        ctx.checkpoint()?;
        let number = cut.index + 1;
        let path = name_for(number);
        let line = format!(
            "  -> Scene {}: start {}s, duration {:.1}s",
            number,
            cut.start.floor(),
            cut.length
        );
        reporter.log_line(&line);
        debug!("{}", line.trim_start());

        let invocation = ffmpeg::cut(
            tools,
            request.input,
            cut.start,
            cut.length,
            &path,
            request.fast_split,
        );
        runner.run(&invocation, ctx)?;

        segments.push(Segment {
            path,
            start: cut.start,
            length: cut.length,
            index: cut.index,
        });
    }

    Ok(segments)
}
