// ============================================================================
// reelmix-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Mode Parameters and Folder Layout
//
// This module defines the configuration consumed by the pipeline: the three
// working folders, the processing mode and every mode parameter the caller
// can tune. Instances are created by consumers of the library (like
// reelmix-cli), usually through `MixConfigBuilder` or the JSON settings file,
// and passed to `Pipeline::new`.
//
// KEY COMPONENTS:
// - MixConfig: Main configuration structure for a run
// - ProcessingMode: Which per-file sub-pipeline runs
// - Default constants: Values used when nothing else is configured

mod builder;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use builder::MixConfigBuilder;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default shortest segment length in whole seconds.
pub const DEFAULT_MIN_SEGMENT_SECS: u32 = 15;

/// Default longest segment length in whole seconds.
pub const DEFAULT_MAX_SEGMENT_SECS: u32 = 20;

/// Default number of segments joined into one mix.
pub const DEFAULT_SEGMENTS_PER_OUTPUT: usize = 3;

/// Default number of mixes produced per source video.
pub const DEFAULT_OUTPUTS_PER_INPUT: usize = 3;

/// Default fingerprint similarity at or above which a segment is a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.92;

// ============================================================================
// PROCESSING MODE
// ============================================================================

/// Determines which sub-pipeline runs for every source file.
///
/// The mode is fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Cut each source into randomized segments written to the output folder.
    #[default]
    SplitOnly,
    /// Cut into a temporary folder, optionally dedup and review, then mix.
    SplitReview,
    /// Cut one clip per time bucket straight into each mix.
    DirectMix,
}

impl ProcessingMode {
    /// Whether this mode produces mix videos (and therefore a known output count).
    pub fn produces_mixes(self) -> bool {
        !matches!(self, ProcessingMode::SplitOnly)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessingMode::SplitOnly => "split-only",
            ProcessingMode::SplitReview => "split-review",
            ProcessingMode::DirectMix => "direct-mix",
        };
        f.write_str(label)
    }
}

// ============================================================================
// MIX CONFIGURATION
// ============================================================================

/// Main configuration structure for a reelmix run.
///
/// All fields have sensible defaults, so only the three folders usually need
/// to be set.
///
/// # Examples
///
/// ```rust,no_run
/// use reelmix_core::config::{MixConfigBuilder, ProcessingMode};
///
/// let config = MixConfigBuilder::new()
///     .input_dir("/videos/input")
///     .output_dir("/videos/output")
///     .processed_dir("/videos/processed")
///     .mode(ProcessingMode::SplitReview)
///     .segment_range(8, 12)
///     .segments_per_output(4)
///     .build();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    // ---- Path Configuration ----
    /// Folder scanned for source videos
    pub input_dir: PathBuf,

    /// Folder receiving segments, mixes and per-file temporary folders
    pub output_dir: PathBuf,

    /// Folder that completed sources are moved into
    pub processed_dir: PathBuf,

    // ---- Segmentation ----
    /// Shortest segment length in whole seconds (>= 1)
    pub min_segment_secs: u32,

    /// Longest segment length in whole seconds (>= min)
    pub max_segment_secs: u32,

    /// Stream-copy cuts when true, frame-accurate re-encode otherwise
    pub fast_split: bool,

    // ---- Mixing ----
    pub mode: ProcessingMode,

    pub segments_per_output: usize,

    pub outputs_per_input: usize,

    /// Join adjacent segments with a short crossfade instead of a hard cut
    pub crossfade: bool,

    // ---- Review ----
    /// Drop visually near-duplicate segments before mixing (split-review only)
    pub auto_dedup: bool,

    /// Similarity in (0,1) at or above which a segment counts as a duplicate
    pub similarity_threshold: f64,

    /// Hand the segment folder to the review collaborator before mixing
    pub pause_for_manual_delete: bool,

    /// Seed for the run's random generator; entropy is used when absent
    pub seed: Option<u64>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            processed_dir: PathBuf::from("processed"),
            min_segment_secs: DEFAULT_MIN_SEGMENT_SECS,
            max_segment_secs: DEFAULT_MAX_SEGMENT_SECS,
            fast_split: true,
            mode: ProcessingMode::default(),
            segments_per_output: DEFAULT_SEGMENTS_PER_OUTPUT,
            outputs_per_input: DEFAULT_OUTPUTS_PER_INPUT,
            crossfade: false,
            auto_dedup: true,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            pause_for_manual_delete: true,
            seed: None,
        }
    }
}

impl MixConfig {
    /// Creates a configuration with default parameters for the given folders.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf, processed_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            processed_dir,
            ..Self::default()
        }
    }

    /// Checks the mode parameters, returning `CoreError::Config` on the first violation.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_segment_secs < 1 {
            return Err(CoreError::Config(
                "Minimum segment length must be at least 1 second".to_string(),
            ));
        }
        if self.min_segment_secs > self.max_segment_secs {
            return Err(CoreError::Config(format!(
                "Minimum segment length ({}s) exceeds maximum ({}s)",
                self.min_segment_secs, self.max_segment_secs
            )));
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold < 1.0) {
            return Err(CoreError::Config(format!(
                "Similarity threshold must be between 0 and 1 (exclusive), got {}",
                self.similarity_threshold
            )));
        }
        if self.segments_per_output < 1 || self.outputs_per_input < 1 {
            return Err(CoreError::Config("Mix values are invalid.".to_string()));
        }
        Ok(())
    }
}
