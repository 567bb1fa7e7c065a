// ============================================================================
// reelmix-core/src/processing/pipeline.rs
// ============================================================================
//
// BATCH ORCHESTRATION: Discover, process and finalize every input file
//
// WORKFLOW:
// 1. Validate the configuration and create the output/processed folders
// 2. Discover supported videos in the input folder
// 3. For each file:
//    a. Ask the processing gate whether the batch may continue
//    b. Probe dimensions and duration, normalizing odd dimensions
//    c. Run the per-mode sub-pipeline (split, split+review or direct mix)
//    d. Register and move the source to the processed folder
//    e. Report progress and the remaining-time estimate
// 4. Report the batch summary
//
// Per-file errors are reported and leave the source in place. Cancellation
// ends the whole batch.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::concat::concat_segments;
use super::direct_mix::{DirectMixRequest, direct_mix};
use super::sampler::{pick_indices_bucketed, selection_key};
use super::segmenter::{Segment, SplitRequest, split_video};
use super::similarity::{filter_similar_segments, fingerprint_segment};
use crate::config::{MixConfig, ProcessingMode};
use crate::context::RunContext;
use crate::discovery::{Discovered, scan_input_dir};
use crate::error::{CoreError, CoreResult};
use crate::external::{MediaProbe, ToolPaths, ToolRunner, ffmpeg};
use crate::gates::{AllowAll, ProcessingGate, ReviewGate, SkipReview};
use crate::progress::{BatchSummary, ProgressTracker};
use crate::reporting::{BatchStartInfo, FileProgressContext, Reporter};
use crate::temp_files::ScopedDir;
use crate::utils::{file_timestamp, get_file_stem, get_filename_safe, move_to_processed};

const SEGMENTS_DIR: &str = "_segments";
const DIRECT_DIR: &str = "_direct";
const NORMALIZED_DIR: &str = "_normalized";

/// Everything one batch run needs, borrowed from the caller.
pub struct Pipeline<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    config: &'a MixConfig,
    ctx: &'a RunContext,
    reporter: &'a dyn Reporter,
    gate: &'a dyn ProcessingGate,
    review: &'a dyn ReviewGate,
}

/// Per-file names derived once, before any work starts.
struct FileJob<'p> {
    source: &'p Path,
    name: String,
    base: String,
    timestamp: String,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with no processing limit and no manual review wait.
    pub fn new(
        runner: &'a dyn ToolRunner,
        tools: &'a ToolPaths,
        config: &'a MixConfig,
        ctx: &'a RunContext,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            runner,
            tools,
            config,
            ctx,
            reporter,
            gate: &AllowAll,
            review: &SkipReview,
        }
    }

    pub fn with_gate(mut self, gate: &'a dyn ProcessingGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_review(mut self, review: &'a dyn ReviewGate) -> Self {
        self.review = review;
        self
    }

    /// Runs the batch with a generator seeded from `config.seed`, or from
    /// system entropy when no seed is set.
    pub fn run_with_config_seed(&self) -> CoreResult<BatchSummary> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run(&mut rng)
    }

    /// Processes every supported file in the input folder.
    ///
    /// # Errors
    ///
    /// * `CoreError::Config` - the configuration is invalid
    /// * `CoreError::Discovery` - the input folder is missing or unreadable
    /// * `CoreError::Cancelled` - the run was cancelled; the file in flight stays in place
    ///
    /// Every other failure is confined to its file and reported through the
    /// [`Reporter`]; the batch then moves on.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> CoreResult<BatchSummary> {
        let config = self.config;
        config.validate()?;
        fs::create_dir_all(&config.output_dir)?;
        fs::create_dir_all(&config.processed_dir)?;

        let files = match scan_input_dir(&config.input_dir)? {
            Discovered::Empty => {
                self.say("Input folder is empty. Nothing to process.");
                return Ok(self.finish(&self.new_tracker(0), 0));
            }
            Discovered::NoSupportedFiles => {
                self.say("No supported video files found in the input folder.");
                return Ok(self.finish(&self.new_tracker(0), 0));
            }
            Discovered::Files(files) => files,
        };

        self.say(&format!("Found {} video file(s) to process.", files.len()));
        self.reporter.batch_started(&BatchStartInfo {
            total_files: files.len(),
            file_list: files
                .iter()
                .map(|f| display_name(f))
                .collect(),
            output_dir: config.output_dir.display().to_string(),
            mode: config.mode.to_string(),
        });

        let mut tracker = self.new_tracker(files.len());
        self.reporter.progress(&tracker.snapshot());

        match self.process_files(&files, &mut tracker, rng) {
            Ok(skipped) => Ok(self.finish(&tracker, skipped)),
            Err(e) => {
                if e.is_cancelled() {
                    self.say("Run cancelled.");
                }
                Err(e)
            }
        }
    }

    fn new_tracker(&self, total_inputs: usize) -> ProgressTracker {
        ProgressTracker::new(
            total_inputs,
            self.config.outputs_per_input,
            self.config.mode.produces_mixes(),
        )
    }

    fn finish(&self, tracker: &ProgressTracker, skipped: usize) -> BatchSummary {
        self.reporter.progress(&tracker.final_snapshot());
        let summary = tracker.summary(skipped);
        info!(
            "Batch finished: {} succeeded, {} failed, {} skipped, {} output(s)",
            summary.succeeded, summary.failed, summary.skipped, summary.generated_outputs
        );
        self.reporter.batch_complete(&summary);
        self.say("All done!");
        summary
    }

    /// Returns the number of files skipped by the processing gate.
    fn process_files<R: Rng + ?Sized>(
        &self,
        files: &[PathBuf],
        tracker: &mut ProgressTracker,
        rng: &mut R,
    ) -> CoreResult<usize> {
        let total = files.len();

        for (idx, source) in files.iter().enumerate() {
            self.ctx.checkpoint()?;

            if !self.gate.can_process(source) {
                self.say("Input limit reached. Skipping remaining files.");
                return Ok(total - idx);
            }

            let name = display_name(source);
            self.reporter.file_started(&FileProgressContext {
                current_file: idx + 1,
                total_files: total,
                file_name: name.clone(),
            });
            self.say(&format!("Processing {}...", name));

            match self.process_file(source, rng) {
                Ok(outputs) => {
                    tracker.record_success(outputs);
                    self.say(&format!("Done: {}", name));
                }
                Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
                Err(e) => {
                    tracker.record_failure();
                    let message = e.to_string();
                    error!("Error processing {}: {}", name, message);
                    self.reporter
                        .log_line(&format!("Error processing {}: {}", name, message));
                    self.reporter.file_failed(&name, &message);
                }
            }

            let snapshot = tracker.snapshot();
            self.reporter.progress(&snapshot);
            if let Some(line) = tracker.eta_line(&snapshot) {
                self.say(&line);
            }
        }

        Ok(0)
    }

    /// Full sub-pipeline for one source. Returns the number of outputs written.
    fn process_file<R: Rng + ?Sized>(&self, source: &Path, rng: &mut R) -> CoreResult<usize> {
        let job = FileJob {
            source,
            name: get_filename_safe(source)?,
            base: get_file_stem(source)?,
            timestamp: file_timestamp(),
        };

        let probe = MediaProbe::new(self.runner, self.tools);
        let dimensions = probe.dimensions(source, self.ctx)?;
        let total = probe.duration(source, self.ctx)?;

        // Dropping the guard removes the normalized copy on every path
        let (working, _normalized) = if dimensions.is_even() {
            (source.to_path_buf(), None)
        } else {
            self.say(&format!("Re-encoding {}...", job.name));
            let dir = ScopedDir::create(
                self.config.output_dir.join(NORMALIZED_DIR).join(&job.base),
            )?;
            let target = dir.path().join(normalized_name(source, &job.base));
            self.runner
                .run(&ffmpeg::normalize_dimensions(self.tools, source, &target), self.ctx)?;
            info!(
                "Normalized {}x{} source {} to {}",
                dimensions.width,
                dimensions.height,
                job.name,
                target.display()
            );
            (target, Some(dir))
        };

        let outputs = match self.config.mode {
            ProcessingMode::SplitOnly => self.split_only(&job, &working, total, rng)?,
            ProcessingMode::SplitReview => self.split_review(&job, &working, total, rng)?,
            ProcessingMode::DirectMix => self.direct(&job, &working, total, rng)?,
        };

        self.gate.register_processed(job.source);
        let moved = move_to_processed(job.source, &self.config.processed_dir)?;
        info!("Moved {} to {}", job.name, moved.display());
        Ok(outputs)
    }

    fn split_request<'p>(&self, working: &'p Path, total: f64) -> SplitRequest<'p> {
        SplitRequest {
            input: working,
            total,
            min_secs: self.config.min_segment_secs,
            max_secs: self.config.max_segment_secs,
            fast_split: self.config.fast_split,
        }
    }

    fn split_only<R: Rng + ?Sized>(
        &self,
        job: &FileJob<'_>,
        working: &Path,
        total: f64,
        rng: &mut R,
    ) -> CoreResult<usize> {
        let output_dir = &self.config.output_dir;
        let segments = split_video(
            self.runner,
            self.tools,
            &self.split_request(working, total),
            |n| output_dir.join(format!("{}_scene_{}_{}.mp4", job.base, n, job.timestamp)),
            self.ctx,
            rng,
            self.reporter,
        )?;
        self.say(&format!("Created {} segment(s).", segments.len()));
        Ok(segments.len())
    }

    fn split_review<R: Rng + ?Sized>(
        &self,
        job: &FileJob<'_>,
        working: &Path,
        total: f64,
        rng: &mut R,
    ) -> CoreResult<usize> {
        let config = self.config;
        let needed = config.segments_per_output;
        let work = ScopedDir::create(config.output_dir.join(SEGMENTS_DIR).join(&job.base))?;

        let mut segments = split_video(
            self.runner,
            self.tools,
            &self.split_request(working, total),
            |n| work.path().join(format!("scene_{}_{}.mp4", n, job.timestamp)),
            self.ctx,
            rng,
            self.reporter,
        )?;
        require_segments(segments.len(), needed, "Not enough segments for mixing.")?;

        if config.auto_dedup {
            self.say("Detecting similar segments...");
            segments = filter_similar_segments(
                segments,
                config.similarity_threshold,
                |segment| fingerprint_segment(self.runner, self.tools, &segment.path, self.ctx),
                self.ctx,
                self.reporter,
            )?;
            require_segments(
                segments.len(),
                needed,
                "Not enough segments after filtering.",
            )?;
        }

        if config.pause_for_manual_delete {
            self.say(&format!(
                "Review segments in {} and delete any you do not want.",
                work.path().display()
            ));
            self.reporter.review_requested(work.path());
            self.review.wait_for_review(work.path(), self.ctx)?;
            segments = self.rescan_segments(work.path(), segments)?;
            require_segments(
                segments.len(),
                needed,
                "Not enough segments after manual delete.",
            )?;
        }

        let available = segments.len();
        let mut previous: Option<Vec<usize>> = None;
        for out_idx in 0..config.outputs_per_input {
            self.ctx.checkpoint()?;
            let picks = pick_indices_bucketed(available, needed, previous.as_deref(), rng);
            self.say(&format!("Mix {}: {}", out_idx, selection_key(&picks)));

            let chosen: Vec<&Segment> = picks.iter().map(|&i| &segments[i]).collect();
            let output = config
                .output_dir
                .join(format!("{}_mix_{}_{}.mp4", job.base, out_idx, job.timestamp));
            concat_segments(
                self.runner,
                self.tools,
                &chosen,
                &output,
                config.crossfade,
                self.ctx,
                self.reporter,
            )?;
            self.say(&format!(
                "Completed video {}/{}: {}",
                out_idx + 1,
                config.outputs_per_input,
                display_name(&output)
            ));
            previous = Some(picks);
        }

        Ok(config.outputs_per_input)
    }

    /// Re-reads the review folder after the user is done deleting.
    ///
    /// Files still on disk keep their metadata and cut order. A file the
    /// pipeline did not produce is probed for its length and sorted last.
    fn rescan_segments(&self, folder: &Path, known: Vec<Segment>) -> CoreResult<Vec<Segment>> {
        let mut by_path: HashMap<PathBuf, Segment> =
            known.into_iter().map(|s| (s.path.clone(), s)).collect();
        let next_index = by_path.values().map(|s| s.index + 1).max().unwrap_or(0);

        let mut listed: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_segment_file(path))
            .collect();
        listed.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let probe = MediaProbe::new(self.runner, self.tools);
        let mut segments = Vec::with_capacity(listed.len());
        let mut extra = 0;
        for path in listed {
            match by_path.remove(&path) {
                Some(segment) => segments.push(segment),
                None => {
                    let length = probe.duration(&path, self.ctx)?;
                    warn!("Found unknown segment {} ({:.1}s)", path.display(), length);
                    segments.push(Segment {
                        path,
                        start: 0.0,
                        length,
                        index: next_index + extra,
                    });
                    extra += 1;
                }
            }
        }

        if !by_path.is_empty() {
            info!("{} segment(s) removed during review", by_path.len());
        }
        segments.sort_by_key(|s| s.index);
        Ok(segments)
    }

    fn direct<R: Rng + ?Sized>(
        &self,
        job: &FileJob<'_>,
        working: &Path,
        total: f64,
        rng: &mut R,
    ) -> CoreResult<usize> {
        let config = self.config;
        let work = ScopedDir::create(config.output_dir.join(DIRECT_DIR).join(&job.base))?;
        let request = DirectMixRequest {
            input: working,
            base_name: &job.base,
            timestamp: &job.timestamp,
            total,
            min_secs: config.min_segment_secs,
            max_secs: config.max_segment_secs,
            segments_per_output: config.segments_per_output,
            outputs_per_input: config.outputs_per_input,
            fast_split: config.fast_split,
            crossfade: config.crossfade,
            work_dir: work.path(),
            output_dir: &config.output_dir,
        };
        let written = direct_mix(self.runner, self.tools, &request, self.ctx, rng, self.reporter)?;
        Ok(written.len())
    }

    /// Sends a line to both the file log and the reporter.
    fn say(&self, line: &str) {
        info!("{}", line);
        self.reporter.log_line(line);
    }
}

fn require_segments(available: usize, needed: usize, message: &str) -> CoreResult<()> {
    if available < needed {
        return Err(CoreError::InsufficientSegments(message.to_string()));
    }
    Ok(())
}

fn is_segment_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("scene_") && n.ends_with(".mp4"))
        .unwrap_or(false)
}

fn normalized_name(source: &Path, stem: &str) -> String {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_safe.{}", stem, ext),
        None => format!("{}_safe", stem),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
