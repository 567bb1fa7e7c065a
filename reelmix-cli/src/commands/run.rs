//! Implementation of the 'run' subcommand.
//!
//! Builds the configuration from the settings file and explicit flags, sets
//! up the run log, checks for ffmpeg and ffprobe, then hands the batch to
//! the reelmix-core pipeline with the interactive controls wired in.

use crate::cli::RunArgs;
use crate::control::spawn_stdin_control;
use crate::error::CliResult;
use crate::logging::init_run_log;

use reelmix_core::discovery::scan_input_dir;
use reelmix_core::external::{ProcessRunner, ToolPaths};
use reelmix_core::reporting::{JsonReporter, Reporter, TerminalReporter};
use reelmix_core::settings::{load_settings, save_settings};
use reelmix_core::{
    AllowAll, BatchSummary, InputLimit, LatchReview, MixConfig, MixConfigBuilder, Pipeline,
    ProcessingGate, ResumeLatch, RunContext, check_dependency,
};

use console::style;
use log::info;
use std::path::{Path, PathBuf};

/// Default processed folder for an explicitly given input folder.
fn default_processed_dir(input_dir: &Path) -> PathBuf {
    match input_dir.parent() {
        Some(parent) => parent.join("processed"),
        None => PathBuf::from("processed"),
    }
}

/// Layers explicit flags over `base`. Flags that were not given keep the base value.
pub fn apply_overrides(base: MixConfig, args: &RunArgs) -> MixConfig {
    let min = args.min_seconds.unwrap_or(base.min_segment_secs);
    let max = args.max_seconds.unwrap_or(base.max_segment_secs);
    let mut builder = MixConfigBuilder::from_config(base).segment_range(min, max);

    if let Some(input) = &args.input_dir {
        builder = builder.input_dir(input);
        if args.processed_dir.is_none() {
            builder = builder.processed_dir(default_processed_dir(input));
        }
    }
    if let Some(output) = &args.output_dir {
        builder = builder.output_dir(output);
    }
    if let Some(processed) = &args.processed_dir {
        builder = builder.processed_dir(processed);
    }
    if let Some(mode) = args.mode {
        builder = builder.mode(mode.into());
    }
    if let Some(count) = args.segments_per_output {
        builder = builder.segments_per_output(count);
    }
    if let Some(count) = args.outputs_per_input {
        builder = builder.outputs_per_input(count);
    }
    if args.no_dedup {
        builder = builder.auto_dedup(false);
    }
    if let Some(threshold) = args.similarity {
        builder = builder.similarity_threshold(threshold);
    }
    if args.no_review_pause {
        builder = builder.pause_for_manual_delete(false);
    }
    if args.precise_split {
        builder = builder.fast_split(false);
    }
    if args.crossfade {
        builder = builder.crossfade(true);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    builder.build()
}

/// Main entry point for the run command.
pub fn run_mix(args: RunArgs) -> CliResult<BatchSummary> {
    let base = args
        .settings
        .as_deref()
        .map(load_settings)
        .unwrap_or_default();
    let config = apply_overrides(base, &args);
    config.validate()?;

    if args.save_settings {
        if let Some(path) = &args.settings {
            save_settings(path, &config)?;
            info!("Saved settings to {}", path.display());
        }
    }

    // Fail on a missing input folder before touching anything else
    scan_input_dir(&config.input_dir)?;

    if !args.no_log {
        let log_dir = args
            .log_dir
            .clone()
            .unwrap_or_else(|| config.output_dir.join("logs"));
        let log_path = init_run_log(&log_dir, args.verbose)?;
        if !args.json {
            println!("{} {}", style("Log file:").bold(), log_path.display());
        }
    }
    info!("Reelmix run started: {}", chrono::Local::now());
    info!("Input: {}", config.input_dir.display());
    info!("Output: {}", config.output_dir.display());
    info!("Processed: {}", config.processed_dir.display());
    info!("Mode: {}", config.mode);

    let tools = ToolPaths::resolve();
    check_dependency(&tools.ffmpeg)?;
    check_dependency(&tools.ffprobe)?;
    info!("External dependency check passed.");

    let ctx = RunContext::new();
    let latch = ResumeLatch::new();
    spawn_stdin_control(ctx.control(), latch.clone());

    let reporter: Box<dyn Reporter> = if args.json {
        Box::new(JsonReporter::new())
    } else {
        println!(
            "{}",
            style("Controls: p = pause, r = resume, q = cancel, Enter = continue after review")
                .dim()
        );
        Box::new(TerminalReporter::new())
    };

    let limit = args.max_inputs.map(InputLimit::new);
    let gate: &dyn ProcessingGate = match &limit {
        Some(limit) => limit,
        None => &AllowAll,
    };
    let review = LatchReview::new(latch);
    let runner = ProcessRunner::new();

    Pipeline::new(&runner, &tools, &config, &ctx, reporter.as_ref())
        .with_gate(gate)
        .with_review(&review)
        .run_with_config_seed()
}
