//! Temporally diverse segment sampling.
//!
//! The ordered segment list is split into `K` contiguous buckets and every
//! mix takes one random segment per bucket, so each output spans the whole
//! source. Consecutive mixes try to avoid repeating the same selection.

use std::ops::Range;

use rand::Rng;

/// Attempts at drawing a selection different from the previous one.
pub const MAX_REPEAT_RETRIES: usize = 30;

/// Partitions `[0, n)` into `k` contiguous buckets.
///
/// Bucket `i` is `[floor(i*n/k), floor((i+1)*n/k))`. A bucket that would be
/// empty is widened to one index, so when `k > n` some indices appear in more
/// than one bucket. `n` must be at least 1.
pub fn build_buckets(n: usize, k: usize) -> Vec<Range<usize>> {
    (0..k)
        .map(|i| {
            let start = i * n / k;
            let mut end = (i + 1) * n / k;
            if end <= start {
                end = start + 1;
            }
            start..end.min(n)
        })
        .collect()
}

fn draw<R: Rng + ?Sized>(buckets: &[Range<usize>], rng: &mut R) -> Vec<usize> {
    buckets
        .iter()
        .map(|bucket| rng.gen_range(bucket.clone()))
        .collect()
}

/// Picks one index per bucket, in bucket order.
///
/// Retries up to [`MAX_REPEAT_RETRIES`] times while the draw equals
/// `previous`, then accepts one more draw even if it repeats.
pub fn pick_indices_bucketed<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    previous: Option<&[usize]>,
    rng: &mut R,
) -> Vec<usize> {
    let buckets = build_buckets(n, k);
    for _ in 0..MAX_REPEAT_RETRIES {
        let indices = draw(&buckets, rng);
        if previous != Some(indices.as_slice()) {
            return indices;
        }
    }
    draw(&buckets, rng)
}

/// Comma-joined selection, as shown in the mix log line.
pub fn selection_key(indices: &[usize]) -> String {
    indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
