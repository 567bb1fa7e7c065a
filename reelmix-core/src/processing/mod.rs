//! Segmentation, deduplication, sampling and joining, plus the batch
//! orchestrator that strings them together per input file.

pub mod concat;
pub mod direct_mix;
pub mod pipeline;
pub mod sampler;
pub mod segmenter;
pub mod similarity;

#[cfg(test)]
mod tests;

pub use concat::{CrossfadeGraph, build_crossfade_graph, concat_segments, fade_duration};
pub use direct_mix::{DirectMixRequest, TimeBucket, build_time_buckets, direct_mix};
pub use pipeline::Pipeline;
pub use sampler::{build_buckets, pick_indices_bucketed, selection_key};
pub use segmenter::{Segment, SegmentPlanner, SplitRequest, split_video};
pub use similarity::{Fingerprint, filter_similar_segments, fingerprint_segment};
