//! Differentiable moving-image mask.
//!
//! Metrics that weight samples by mask overlap need the mask weight to be
//! differentiable with respect to the mapped point, otherwise the overlap
//! term contributes nothing to the gradient. The user's binary mask is
//! rasterized onto the moving-image grid once and then read back through a
//! smoothing B-spline interpolator, which turns the hard 0/1 edge into a
//! smooth ramp with an analytic spatial derivative.

use regkit_core::image::Image;
use regkit_core::interpolation::{BSplineInterpolator, Interpolator};
use regkit_core::spatial::{Point, Vector};

/// Smooth, differentiable view of a binary moving mask.
#[derive(Debug, Clone)]
pub struct DifferentiableMask<const D: usize> {
    mask_image: Image<D>,
    interpolator: BSplineInterpolator,
}

impl<const D: usize> DifferentiableMask<D> {
    /// Rasterize a mask over the moving-image extent.
    ///
    /// Each moving voxel gets weight 1 where the user mask is positive at
    /// the corresponding physical location (nearest-voxel lookup) and 0
    /// elsewhere, including everywhere outside the user mask's extent.
    /// With no user mask the weight is 1 over the whole moving extent.
    /// `order` selects the smoothing spline degree; order 2 gives a
    /// two-voxel transition band.
    pub fn new(moving: &Image<D>, user_mask: Option<&Image<D>>, order: usize) -> Self {
        let mask_image = match user_mask {
            None => Image::from_fn(
                moving.shape(),
                *moving.origin(),
                *moving.spacing(),
                *moving.direction(),
                |_| 1.0,
            ),
            Some(mask) => Image::from_fn(
                moving.shape(),
                *moving.origin(),
                *moving.spacing(),
                *moving.direction(),
                |index| {
                    let physical = moving.transform_index_to_physical_point(index);
                    let in_mask = mask.transform_physical_point_to_continuous_index(&physical);
                    if !mask.is_inside_buffer(&in_mask) {
                        return 0.0;
                    }
                    if mask.pixel(mask.nearest_index(&in_mask)) > 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                },
            ),
        };
        Self {
            mask_image,
            interpolator: BSplineInterpolator::with_order(order),
        }
    }

    /// The rasterized mask image.
    pub fn mask_image(&self) -> &Image<D> {
        &self.mask_image
    }

    /// Mask weight at a physical point, optionally with its spatial
    /// derivative.
    ///
    /// The weight is clamped to `[0, 1]` after interpolation since the
    /// smoothing spline can overshoot near the edge. Points outside the
    /// moving extent get weight 0 with a zero derivative.
    pub fn evaluate(
        &self,
        point: &Point<D>,
        want_derivative: bool,
    ) -> (f64, Option<Vector<D>>) {
        let index = self
            .mask_image
            .transform_physical_point_to_continuous_index(point);
        if !self.mask_image.is_inside_buffer(&index) {
            let derivative = want_derivative.then(Vector::zeros);
            return (0.0, derivative);
        }
        if want_derivative {
            let (value, derivative) = self
                .interpolator
                .evaluate_with_derivative(&self.mask_image, &index)
                .unwrap_or_else(|| {
                    (self.interpolator.evaluate(&self.mask_image, &index), Vector::zeros())
                });
            (value.clamp(0.0, 1.0), Some(derivative))
        } else {
            let value = self.interpolator.evaluate(&self.mask_image, &index);
            (value.clamp(0.0, 1.0), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regkit_core::spatial::{Direction, Spacing};

    fn moving_image() -> Image<2> {
        Image::from_fn(
            [12, 12],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            |idx| (idx[0] + idx[1]) as f64,
        )
    }

    /// Binary disk mask on the same grid as the moving image.
    fn disk_mask() -> Image<2> {
        Image::from_fn(
            [12, 12],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            |idx| {
                let dx = idx[0] as f64 - 5.5;
                let dy = idx[1] as f64 - 5.5;
                if dx * dx + dy * dy <= 9.0 {
                    1.0
                } else {
                    0.0
                }
            },
        )
    }

    #[test]
    fn test_no_mask_is_uniform_one() {
        let moving = moving_image();
        let mask = DifferentiableMask::new(&moving, None, 2);
        let (value, derivative) = mask.evaluate(&Point::new([5.0, 5.0]), true);
        assert!((value - 1.0).abs() < 1e-9);
        let d = derivative.unwrap();
        assert!(d[0].abs() < 1e-9);
        assert!(d[1].abs() < 1e-9);
    }

    #[test]
    fn test_deep_inside_and_far_outside() {
        let moving = moving_image();
        let mask = DifferentiableMask::new(&moving, Some(&disk_mask()), 2);
        let (inside, _) = mask.evaluate(&Point::new([5.5, 5.5]), false);
        assert!(inside > 0.99);
        let (outside, _) = mask.evaluate(&Point::new([0.5, 0.5]), false);
        assert!(outside < 0.01);
    }

    #[test]
    fn test_outside_moving_extent_is_zero() {
        let moving = moving_image();
        let mask = DifferentiableMask::new(&moving, Some(&disk_mask()), 2);
        let (value, derivative) = mask.evaluate(&Point::new([-3.0, 5.0]), true);
        assert_eq!(value, 0.0);
        assert_eq!(derivative.unwrap()[0], 0.0);
    }

    #[test]
    fn test_transition_band_is_monotonic() {
        let moving = moving_image();
        let mask = DifferentiableMask::new(&moving, Some(&disk_mask()), 2);
        // Walk outward from the disk center along one axis.
        let mut prev = f64::INFINITY;
        for k in 0..12 {
            let x = 5.5 + 0.5 * k as f64;
            if x > 10.0 {
                break;
            }
            let (value, _) = mask.evaluate(&Point::new([x, 5.5]), false);
            assert!(value <= prev + 1e-9, "mask not decreasing at x = {x}");
            assert!((0.0..=1.0).contains(&value));
            prev = value;
        }
    }

    #[test]
    fn test_derivative_nonzero_only_near_edge() {
        let moving = moving_image();
        let mask = DifferentiableMask::new(&moving, Some(&disk_mask()), 2);
        let (_, center) = mask.evaluate(&Point::new([5.5, 5.5]), true);
        assert!(center.unwrap().norm() < 1e-6);
        // At the disk boundary (radius 3) the weight falls off.
        let (_, edge) = mask.evaluate(&Point::new([8.5, 5.5]), true);
        assert!(edge.unwrap().norm() > 0.05);
    }
}
