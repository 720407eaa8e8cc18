//! Multi-linear interpolation (bilinear in 2D, trilinear in 3D).

use crate::image::Image;
use crate::spatial::Point;

use super::trait_::Interpolator;

/// Linear interpolator.
///
/// Blends the 2^D pixels surrounding the continuous index, with reads
/// clamped at the image border. The kernel is only C0, so spatial
/// derivatives are left to a numeric gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    /// Create a new linear interpolator.
    pub fn new() -> Self {
        Self
    }
}

impl<const D: usize> Interpolator<D> for LinearInterpolator {
    fn evaluate(&self, image: &Image<D>, index: &Point<D>) -> f64 {
        let mut base = [0isize; D];
        let mut frac = [0.0f64; D];
        for d in 0..D {
            let floor = index[d].floor();
            base[d] = floor as isize;
            frac[d] = index[d] - floor;
        }

        // Accumulate over the 2^D corner pixels; bit d of the corner mask
        // selects the near or far tap along axis d.
        let mut value = 0.0;
        for corner in 0..(1usize << D) {
            let mut weight = 1.0;
            let mut tap = [0isize; D];
            for d in 0..D {
                if corner & (1 << d) != 0 {
                    weight *= frac[d];
                    tap[d] = base[d] + 1;
                } else {
                    weight *= 1.0 - frac[d];
                    tap[d] = base[d];
                }
            }
            if weight != 0.0 {
                value += weight * image.pixel_clamped(tap);
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction2, Point2, Spacing2};

    fn image_2x2(values: [f64; 4]) -> Image<2> {
        Image::new(
            values.to_vec(),
            [2, 2],
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
        )
    }

    #[test]
    fn test_linear_at_grid_points() {
        let image = image_2x2([0.0, 1.0, 2.0, 3.0]);
        let interp = LinearInterpolator::new();
        assert_eq!(interp.evaluate(&image, &Point2::new([0.0, 0.0])), 0.0);
        assert_eq!(interp.evaluate(&image, &Point2::new([0.0, 1.0])), 1.0);
        assert_eq!(interp.evaluate(&image, &Point2::new([1.0, 0.0])), 2.0);
        assert_eq!(interp.evaluate(&image, &Point2::new([1.0, 1.0])), 3.0);
    }

    #[test]
    fn test_linear_at_center() {
        let image = image_2x2([0.0, 1.0, 10.0, 11.0]);
        let interp = LinearInterpolator::new();
        let center = interp.evaluate(&image, &Point2::new([0.5, 0.5]));
        assert!((center - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_linear_clamps_at_border() {
        let image = image_2x2([0.0, 1.0, 2.0, 3.0]);
        let interp = LinearInterpolator::new();
        // Reads beyond the edge clamp to the edge pixel.
        assert_eq!(interp.evaluate(&image, &Point2::new([-0.5, -0.5])), 0.0);
        assert_eq!(interp.evaluate(&image, &Point2::new([1.5, 1.5])), 3.0);
    }
}
