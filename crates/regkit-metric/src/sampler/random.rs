//! Random sub-voxel sampler.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use regkit_core::image::{Image, Region};
use regkit_core::interpolation::{Interpolator, LinearInterpolator};
use regkit_core::spatial::Point;

use crate::error::{MetricError, Result};

use super::trait_::{ImageSample, ImageSampler};

/// Draws a fixed number of uniformly random sub-voxel coordinates per pass.
///
/// Coordinates are continuous indices inside the region, so fixed values are
/// read through linear interpolation rather than at voxel centers. Seedable
/// for reproducible sampling sequences.
#[derive(Debug)]
pub struct RandomCoordinateSampler {
    count: usize,
    rng: StdRng,
    interpolator: LinearInterpolator,
}

impl RandomCoordinateSampler {
    /// Create a sampler drawing `count` coordinates per pass, seeded from
    /// system entropy.
    pub fn new(count: usize) -> Self {
        Self::with_seed(count, rand::rng().random())
    }

    /// Create a sampler with an explicit seed.
    pub fn with_seed(count: usize, seed: u64) -> Self {
        Self {
            count,
            rng: StdRng::seed_from_u64(seed),
            interpolator: LinearInterpolator::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl<const D: usize> ImageSampler<D> for RandomCoordinateSampler {
    fn prepare(&mut self, _image: &Image<D>, region: &Region<D>) -> Result<()> {
        if self.count == 0 {
            return Err(MetricError::configuration("sample count must be positive"));
        }
        if region.num_pixels() == 0 {
            return Err(MetricError::configuration("sampling region is empty"));
        }
        Ok(())
    }

    fn sample(&mut self, image: &Image<D>, region: &Region<D>) -> Vec<ImageSample<D>> {
        let index = region.index();
        let size = region.size();
        let mut samples = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let mut continuous = Point::origin();
            for d in 0..D {
                let lo = index[d] as f64;
                let hi = lo + (size[d] - 1) as f64;
                continuous[d] = self.rng.random_range(lo..=hi);
            }
            samples.push(ImageSample {
                point: image.transform_continuous_index_to_physical_point(&continuous),
                value: self.interpolator.evaluate(image, &continuous),
            });
        }
        samples
    }
}
