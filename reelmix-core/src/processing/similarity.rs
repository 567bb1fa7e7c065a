// ============================================================================
// reelmix-core/src/processing/similarity.rs
// ============================================================================
//
// SIMILARITY FILTER: Perceptual Duplicate Removal
//
// Each segment is summarized by a 1024-bit fingerprint: its first frame is
// scaled to 32x32 grayscale and every pixel becomes one bit, set when the
// pixel is at least the frame's mean luminance. Two fingerprints are compared
// by the fraction of equal bits.
//
// Filtering is a greedy single pass. A segment is dropped (and its file
// deleted) when it is at least `threshold` similar to any segment already
// kept; kept segments are never revisited. The pairwise scan is quadratic,
// which is fine for the tens of segments one source produces.

use std::fs;
use std::path::Path;

use image::GrayImage;
use log::{debug, warn};

use super::segmenter::Segment;
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};
use crate::external::{ToolPaths, ToolRunner, ffmpeg};
use crate::reporting::Reporter;
use crate::temp_files::create_temp_file_in_system_dir;

/// Side length of the fingerprint thumbnail.
pub const FINGERPRINT_SIDE: u32 = 32;

/// Number of bits in a fingerprint.
pub const FINGERPRINT_BITS: usize = (FINGERPRINT_SIDE * FINGERPRINT_SIDE) as usize;

/// 1024-bit perceptual signature of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    bits: [u64; FINGERPRINT_BITS / 64],
}

impl Fingerprint {
    /// Thresholds raw luma samples against their own mean.
    ///
    /// Fails unless exactly 1024 samples are given.
    pub fn from_luma(pixels: &[u8]) -> CoreResult<Self> {
        if pixels.len() != FINGERPRINT_BITS {
            return Err(CoreError::Probe(format!(
                "Fingerprint frame has {} pixels, expected {}",
                pixels.len(),
                FINGERPRINT_BITS
            )));
        }

        let mean = pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / FINGERPRINT_BITS as f64;
        let mut bits = [0u64; FINGERPRINT_BITS / 64];
        for (i, &pixel) in pixels.iter().enumerate() {
            if f64::from(pixel) >= mean {
                bits[i / 64] |= 1 << (i % 64);
            }
        }
        Ok(Self { bits })
    }

    /// Builds a fingerprint from a decoded image, resizing to 32x32 if needed.
    pub fn from_image(image: &image::DynamicImage) -> CoreResult<Self> {
        let luma: GrayImage = if image.width() == FINGERPRINT_SIDE && image.height() == FINGERPRINT_SIDE {
            image.to_luma8()
        } else {
            image
                .resize_exact(
                    FINGERPRINT_SIDE,
                    FINGERPRINT_SIDE,
                    image::imageops::FilterType::Triangle,
                )
                .to_luma8()
        };
        Self::from_luma(luma.as_raw())
    }

    /// Fraction of equal bits, in `[0, 1]`.
    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        let differing: u32 = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        1.0 - f64::from(differing) / FINGERPRINT_BITS as f64
    }

    /// Fingerprint with every bit inverted.
    pub fn inverted(&self) -> Self {
        let mut bits = self.bits;
        for word in &mut bits {
            *word = !*word;
        }
        Self { bits }
    }
}

/// Extracts the first frame of `segment` through ffmpeg and fingerprints it.
pub fn fingerprint_segment(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    segment: &Path,
    ctx: &RunContext,
) -> CoreResult<Fingerprint> {
    // Removed when the handle drops, whatever happens below
    let frame_file = create_temp_file_in_system_dir("frame", "png")?;
    let invocation = ffmpeg::thumbnail(tools, segment, frame_file.path());
    runner.run(&invocation, ctx)?;

    let image = image::open(frame_file.path())?;
    Fingerprint::from_image(&image)
}

/// Greedy near-duplicate removal.
///
/// `fingerprint` is called once per segment in order. A fingerprint failure
/// keeps the segment and reports a warning; only `Cancelled` aborts.
pub fn filter_similar_segments<F>(
    segments: Vec<Segment>,
    threshold: f64,
    mut fingerprint: F,
    ctx: &RunContext,
    reporter: &dyn Reporter,
) -> CoreResult<Vec<Segment>>
where
    F: FnMut(&Segment) -> CoreResult<Fingerprint>,
{
    let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut kept_prints: Vec<Fingerprint> = Vec::with_capacity(segments.len());

    for segment in segments {
        ctx.checkpoint()?;
        let name = display_name(&segment.path);

        let print = match fingerprint(&segment) {
            Ok(print) => print,
            Err(CoreError::Cancelled) => return Err(CoreError::Cancelled),
            Err(e) => {
                let message = format!("Skip hash {}: {}", name, e);
                warn!("{}", message);
                reporter.warning(&message);
                kept.push(segment);
                continue;
            }
        };

        let duplicate = kept_prints
            .iter()
            .any(|other| print.similarity(other) >= threshold);

        if duplicate {
            reporter.log_line(&format!("Delete similar segment: {}", name));
            debug!("Dropping near-duplicate segment {}", segment.path.display());
            if let Err(e) = fs::remove_file(&segment.path) {
                debug!("Could not delete {}: {}", segment.path.display(), e);
            }
        } else {
            kept_prints.push(print);
            kept.push(segment);
        }
    }

    Ok(kept)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
