//! Sampler trait producing fixed-image sample points.

use regkit_core::image::{Image, Region};
use regkit_core::spatial::Point;

use crate::error::Result;

/// One fixed-image sample: the physical point and the fixed intensity there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSample<const D: usize> {
    /// Physical coordinate of the sample in fixed-image space.
    pub point: Point<D>,
    /// Fixed-image intensity at the sample.
    pub value: f64,
}

/// Strategy for drawing sample points from the fixed image.
///
/// Each call to `sample` produces a fresh, finite batch over the given
/// region; ordering is sampler-defined and need not be stable across calls.
/// The metric iterates the batch once per evaluation pass.
pub trait ImageSampler<const D: usize>: Send {
    /// Validate the sampler against the image/region it will draw from.
    ///
    /// Called once by the metric's initialization; the default accepts any
    /// non-empty region.
    fn prepare(&mut self, image: &Image<D>, region: &Region<D>) -> Result<()> {
        let _ = image;
        if region.num_pixels() == 0 {
            return Err(crate::error::MetricError::configuration(
                "sampling region is empty",
            ));
        }
        Ok(())
    }

    /// Draw a batch of samples from the region.
    fn sample(&mut self, image: &Image<D>, region: &Region<D>) -> Vec<ImageSample<D>>;
}
