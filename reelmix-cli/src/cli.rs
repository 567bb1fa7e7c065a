// reelmix-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Parser, Subcommand, ValueEnum};
use reelmix_core::ProcessingMode;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Reelmix: bulk video segmentation and re-mixing",
    long_about = "Cuts source videos into randomized segments, drops near-duplicates and \
                  joins temporally diverse selections into new mix videos using ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Processes every video in the input folder
    Run(RunArgs),
    /// Prints the duration and dimensions of a video file
    Probe(ProbeArgs),
}

/// Processing mode as spelled on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Only cut segments into the output folder
    SplitOnly,
    /// Cut, dedup, review, then mix
    SplitReview,
    /// Cut one clip per time bucket straight into each mix
    DirectMix,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::SplitOnly => ProcessingMode::SplitOnly,
            ModeArg::SplitReview => ProcessingMode::SplitReview,
            ModeArg::DirectMix => ProcessingMode::DirectMix,
        }
    }
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    // --- Folders ---
    /// Folder containing the source videos
    #[arg(short = 'i', long = "input", value_name = "INPUT_DIR")]
    pub input_dir: Option<PathBuf>,

    /// Folder receiving segments and mixes
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Folder that finished sources are moved to (defaults to INPUT_DIR/../processed)
    #[arg(long = "processed", value_name = "PROCESSED_DIR")]
    pub processed_dir: Option<PathBuf>,

    // --- Mode and Mix Shape ---
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Shortest segment length in seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u32).range(1..))]
    pub min_seconds: Option<u32>,

    /// Longest segment length in seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_seconds: Option<u32>,

    #[arg(long, value_name = "COUNT")]
    pub segments_per_output: Option<usize>,

    #[arg(long, value_name = "COUNT")]
    pub outputs_per_input: Option<usize>,

    // --- Toggles ---
    /// Keep visually similar segments
    #[arg(long)]
    pub no_dedup: bool,

    /// Similarity in (0,1) at which two segments count as duplicates
    #[arg(long, value_name = "THRESHOLD")]
    pub similarity: Option<f64>,

    /// Mix right after splitting instead of waiting for manual review
    #[arg(long)]
    pub no_review_pause: bool,

    /// Re-encode cuts for frame accuracy instead of stream copying
    #[arg(long)]
    pub precise_split: bool,

    /// Join segments with a short crossfade
    #[arg(long)]
    pub crossfade: bool,

    // --- Run Control and Output ---
    /// Seed for reproducible segment lengths and selections
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Stop after this many successfully processed videos
    #[arg(long, value_name = "COUNT")]
    pub max_inputs: Option<usize>,

    /// Settings file used as the base layer under explicit flags
    #[arg(long, value_name = "FILE", env = "REELMIX_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Write the merged settings back to the settings file
    #[arg(long, requires = "settings")]
    pub save_settings: bool,

    /// Emit progress as JSON lines instead of terminal output
    #[arg(long)]
    pub json: bool,

    /// Debug-level file log
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional: Directory for log files (defaults to OUTPUT_DIR/logs)
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long, conflicts_with = "log_dir")]
    pub no_log: bool,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Video file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}
