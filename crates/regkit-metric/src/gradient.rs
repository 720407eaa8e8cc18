//! Precomputed moving-image gradient field.
//!
//! Fallback derivative source for interpolators that cannot differentiate
//! analytically. The gradient is computed once per moving image by forward
//! differences in index space and read back at the nearest voxel during
//! evaluation, matching the cost profile of nearest-neighbor lookup.

use regkit_core::image::Image;
use regkit_core::spatial::{Point, Vector};

/// Forward-difference gradient of a moving image, one component image per
/// axis.
#[derive(Debug, Clone)]
pub struct ForwardDifferenceGradient<const D: usize> {
    components: Vec<Image<D>>,
}

impl<const D: usize> ForwardDifferenceGradient<D> {
    /// Compute the gradient field of `moving`.
    ///
    /// Component `d` at index `i` holds `moving[i + e_d] - moving[i]` in
    /// index space; the last slice along each axis, where no forward
    /// neighbor exists, is zero.
    pub fn new(moving: &Image<D>) -> Self {
        let shape = moving.shape();
        let mut components = Vec::with_capacity(D);
        for d in 0..D {
            let component = Image::from_fn(
                shape,
                *moving.origin(),
                *moving.spacing(),
                *moving.direction(),
                |index| {
                    if index[d] + 1 >= shape[d] {
                        return 0.0;
                    }
                    let mut next = index;
                    next[d] += 1;
                    moving.pixel(next) - moving.pixel(index)
                },
            );
            components.push(component);
        }
        Self { components }
    }

    /// Gradient at the voxel nearest to a continuous index, in physical
    /// space.
    pub fn evaluate(&self, continuous_index: &Point<D>) -> Vector<D> {
        let geometry = &self.components[0];
        let nearest = geometry.nearest_index(continuous_index);
        let mut index_gradient = Vector::<D>::zeros();
        for d in 0..D {
            index_gradient[d] = self.components[d].pixel(nearest);
        }
        geometry.index_gradient_to_physical(&index_gradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regkit_core::spatial::{Direction, Spacing};

    #[test]
    fn test_gradient_of_linear_ramp() {
        // f(i, j) = 3i + 2j, so the index gradient is (3, 2) everywhere
        // away from the far borders.
        let image = Image::from_fn(
            [6, 6],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            |idx| 3.0 * idx[0] as f64 + 2.0 * idx[1] as f64,
        );
        let gradient = ForwardDifferenceGradient::new(&image);
        let g = gradient.evaluate(&Point::new([2.0, 2.0]));
        assert!((g[0] - 3.0).abs() < 1e-12);
        assert!((g[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_scales_with_spacing() {
        let image = Image::from_fn(
            [6, 6],
            Point::origin(),
            Spacing::new([2.0, 0.5]),
            Direction::identity(),
            |idx| idx[0] as f64,
        );
        let gradient = ForwardDifferenceGradient::new(&image);
        let g = gradient.evaluate(&Point::new([2.0, 2.0]));
        // One intensity unit per index step over 2.0 mm spacing.
        assert!((g[0] - 0.5).abs() < 1e-12);
        assert!(g[1].abs() < 1e-12);
    }

    #[test]
    fn test_far_border_is_zero() {
        let image = Image::from_fn(
            [4, 4],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            |idx| idx[0] as f64 + idx[1] as f64,
        );
        let gradient = ForwardDifferenceGradient::new(&image);
        let g = gradient.evaluate(&Point::new([3.0, 3.0]));
        assert_eq!(g[0], 0.0);
        assert_eq!(g[1], 0.0);
    }

    #[test]
    fn test_nearest_voxel_lookup() {
        let image = Image::from_fn(
            [6, 6],
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            |idx| (idx[0] * idx[0]) as f64,
        );
        let gradient = ForwardDifferenceGradient::new(&image);
        // 2.4 rounds to voxel 2, where the forward difference is 9 - 4.
        let g = gradient.evaluate(&Point::new([2.4, 2.0]));
        assert!((g[0] - 5.0).abs() < 1e-12);
    }
}
