//! Intensity extrema and limiter bound computation.

use rayon::iter::{ParallelBridge, ParallelIterator};

use regkit_core::image::{Image, Region};

/// Compute the minimum and maximum pixel value over a region.
///
/// Returns `(min, max)`. An empty region yields `(inf, -inf)`.
pub fn compute_extrema<const D: usize>(image: &Image<D>, region: &Region<D>) -> (f64, f64) {
    region
        .indices()
        .par_bridge()
        .map(|index| image.pixel(index))
        .fold(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)),
        )
}

/// Derive limiter bounds from true extrema and a range ratio.
///
/// The band is widened by `ratio` times the true range on each side:
/// `min_limit = true_min - ratio * range`, `max_limit = true_max + ratio *
/// range`. A ratio of zero gives bounds equal to the extrema.
pub fn limit_bounds(true_min: f64, true_max: f64, ratio: f64) -> (f64, f64) {
    let range = true_max - true_min;
    (true_min - ratio * range, true_max + ratio * range)
}
