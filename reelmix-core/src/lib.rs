//! Core library for bulk video segmentation and re-mixing using ffmpeg and ffprobe.
//!
//! This crate cuts source videos into randomized-length segments, optionally
//! drops near-duplicate segments, and joins temporally diverse selections into
//! new mix videos. Every subprocess runs through a [`ToolRunner`] and observes
//! a shared [`RunContext`] for pause and cancellation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reelmix_core::{MixConfigBuilder, Pipeline, ProcessingMode, RunContext};
//! use reelmix_core::external::{ProcessRunner, ToolPaths};
//! use reelmix_core::reporting::TerminalReporter;
//!
//! let config = MixConfigBuilder::new()
//!     .input_dir("/videos/input")
//!     .output_dir("/videos/output")
//!     .processed_dir("/videos/processed")
//!     .mode(ProcessingMode::SplitReview)
//!     .pause_for_manual_delete(false)
//!     .build();
//!
//! let runner = ProcessRunner::new();
//! let tools = ToolPaths::resolve();
//! let ctx = RunContext::new();
//! let reporter = TerminalReporter::new();
//!
//! let summary = Pipeline::new(&runner, &tools, &config, &ctx, &reporter)
//!     .run_with_config_seed()
//!     .unwrap();
//! println!("{} mixes written", summary.generated_outputs);
//! ```

pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod gates;
pub mod processing;
pub mod progress;
pub mod reporting;
pub mod settings;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{MixConfig, MixConfigBuilder, ProcessingMode};
pub use context::{ResumeLatch, RunContext, RunControl};
pub use discovery::find_processable_files;
pub use error::{CoreError, CoreResult};
pub use external::{MediaProbe, ToolPaths, ToolRunner, check_dependency};
pub use gates::{AllowAll, InputLimit, LatchReview, ProcessingGate, ReviewGate, SkipReview};
pub use processing::Pipeline;
pub use progress::{BatchSummary, ProgressSnapshot};
pub use utils::format_duration;
