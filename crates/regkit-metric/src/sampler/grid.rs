//! Exhaustive sampler visiting every voxel of the region.

use regkit_core::image::{Image, Region};

use super::trait_::{ImageSample, ImageSampler};

/// Samples every voxel center of the sampling region, in raster order.
///
/// Deterministic and exhaustive; the batch size equals the region's pixel
/// count, so prefer [`RandomCoordinateSampler`](super::RandomCoordinateSampler)
/// for large images.
#[derive(Debug, Clone, Default)]
pub struct FullGridSampler;

impl FullGridSampler {
    pub fn new() -> Self {
        Self
    }
}

impl<const D: usize> ImageSampler<D> for FullGridSampler {
    fn sample(&mut self, image: &Image<D>, region: &Region<D>) -> Vec<ImageSample<D>> {
        let mut samples = Vec::with_capacity(region.num_pixels());
        for index in region.indices() {
            samples.push(ImageSample {
                point: image.transform_index_to_physical_point(index),
                value: image.pixel(index),
            });
        }
        samples
    }
}
