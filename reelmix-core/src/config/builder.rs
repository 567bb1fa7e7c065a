// ============================================================================
// reelmix-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for MixConfig
//
// Fluent construction of MixConfig starting from the defaults. The builder
// performs no validation itself; call `MixConfig::validate` on the result.

use std::path::PathBuf;

use super::{MixConfig, ProcessingMode};

/// Builder for creating MixConfig instances.
#[derive(Debug, Clone, Default)]
pub struct MixConfigBuilder {
    config: MixConfig,
}

impl MixConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from settings.
    pub fn from_config(config: MixConfig) -> Self {
        Self { config }
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn processed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.processed_dir = dir.into();
        self
    }

    pub fn mode(mut self, mode: ProcessingMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets both segment length bounds in whole seconds.
    pub fn segment_range(mut self, min_secs: u32, max_secs: u32) -> Self {
        self.config.min_segment_secs = min_secs;
        self.config.max_segment_secs = max_secs;
        self
    }

    pub fn segments_per_output(mut self, count: usize) -> Self {
        self.config.segments_per_output = count;
        self
    }

    pub fn outputs_per_input(mut self, count: usize) -> Self {
        self.config.outputs_per_input = count;
        self
    }

    pub fn auto_dedup(mut self, enabled: bool) -> Self {
        self.config.auto_dedup = enabled;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn pause_for_manual_delete(mut self, enabled: bool) -> Self {
        self.config.pause_for_manual_delete = enabled;
        self
    }

    pub fn fast_split(mut self, enabled: bool) -> Self {
        self.config.fast_split = enabled;
        self
    }

    pub fn crossfade(mut self, enabled: bool) -> Self {
        self.config.crossfade = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> MixConfig {
        self.config
    }
}
