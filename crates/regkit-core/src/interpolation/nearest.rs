//! Nearest-neighbor interpolation.

use crate::image::Image;
use crate::spatial::Point;

use super::trait_::Interpolator;

/// Nearest-neighbor interpolator.
///
/// Returns the pixel closest to the continuous index. Piecewise constant,
/// so it carries no analytic derivative.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborInterpolator;

impl NearestNeighborInterpolator {
    /// Create a new nearest-neighbor interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<const D: usize> Interpolator<D> for NearestNeighborInterpolator {
    fn evaluate(&self, image: &Image<D>, index: &Point<D>) -> f64 {
        image.pixel(image.nearest_index(index))
    }
}
