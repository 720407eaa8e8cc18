//! B-spline free-form deformation transform with sparse per-point Jacobians.

use nalgebra::DMatrix;

use crate::interpolation::BSplineKernel;
use crate::spatial::{Point, Vector};

use super::trait_::{LocallySupported, Transform};

/// Cubic spline order used for deformation lattices.
pub const DEFORMATION_SPLINE_ORDER: usize = 3;

/// B-spline transform (free-form deformation).
///
/// A regular lattice of control points defines a smooth displacement field:
/// `T(x) = x + sum_k B(u - k) * c_k`, where `u` is the point in lattice
/// coordinates and `c_k` are per-axis control displacements.
///
/// Parameters are laid out in D per-axis blocks of `num_control_points`
/// values each, so the point at lattice cell `k` is influenced by exactly
/// `(order+1)^D` parameters per axis. This local support is what makes
/// sparse Jacobian evaluation worthwhile: the full parameter count grows
/// with lattice resolution while the per-point support stays constant.
#[derive(Debug, Clone)]
pub struct BSplineTransform<const D: usize> {
    grid_size: [usize; D],
    grid_origin: Point<D>,
    grid_spacing: [f64; D],
    grid_strides: [usize; D],
    kernel: BSplineKernel,
    parameters: Vec<f64>,
}

impl<const D: usize> BSplineTransform<D> {
    /// Create a transform with all control displacements zero (identity).
    ///
    /// # Arguments
    /// * `grid_size` - Number of control points along each axis (at least
    ///   order + 1 per axis).
    /// * `grid_origin` - Physical position of the first control point.
    /// * `grid_spacing` - Physical distance between control points.
    pub fn new(grid_size: [usize; D], grid_origin: Point<D>, grid_spacing: [f64; D]) -> Self {
        let kernel = BSplineKernel::new(DEFORMATION_SPLINE_ORDER);
        for d in 0..D {
            assert!(
                grid_size[d] >= kernel.support(),
                "Control grid must have at least order + 1 points per axis"
            );
        }
        let mut grid_strides = [1usize; D];
        for d in (0..D.saturating_sub(1)).rev() {
            grid_strides[d] = grid_strides[d + 1] * grid_size[d + 1];
        }
        let num_control_points: usize = grid_size.iter().product();
        Self {
            grid_size,
            grid_origin,
            grid_spacing,
            grid_strides,
            kernel,
            parameters: vec![0.0; num_control_points * D],
        }
    }

    /// Number of control points in the lattice.
    pub fn num_control_points(&self) -> usize {
        self.grid_size.iter().product()
    }

    /// The control grid size.
    pub fn grid_size(&self) -> [usize; D] {
        self.grid_size
    }

    /// Convert a physical point to lattice coordinates.
    fn lattice_coordinates(&self, point: &Point<D>) -> [f64; D] {
        let mut u = [0.0f64; D];
        for d in 0..D {
            u[d] = (point[d] - self.grid_origin[d]) / self.grid_spacing[d];
        }
        u
    }

    /// First contributing control point per axis, or None when the support
    /// window does not fit inside the lattice.
    fn support_base(&self, u: &[f64; D]) -> Option<[usize; D]> {
        let mut base = [0usize; D];
        for d in 0..D {
            let first = self.kernel.first_tap(u[d]);
            if first < 0 || first as usize + self.kernel.support() > self.grid_size[d] {
                return None;
            }
            base[d] = first as usize;
        }
        Some(base)
    }

    /// Visit every control point in the support window of `u`, yielding the
    /// flat control index and the separable basis weight.
    fn for_each_support_tap(
        &self,
        u: &[f64; D],
        base: &[usize; D],
        mut visit: impl FnMut(usize, usize, f64),
    ) {
        let support = self.kernel.support();
        let taps = support.pow(D as u32);
        for k in 0..taps {
            let mut rest = k;
            let mut weight = 1.0;
            let mut control = 0usize;
            for d in (0..D).rev() {
                let offset = rest % support;
                rest /= support;
                let tap = base[d] + offset;
                weight *= self.kernel.evaluate(u[d] - tap as f64);
                control += tap * self.grid_strides[d];
            }
            visit(k, control, weight);
        }
    }
}

impl<const D: usize> Transform<D> for BSplineTransform<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        let u = self.lattice_coordinates(point);
        let base = match self.support_base(&u) {
            Some(base) => base,
            // The displacement field is zero outside the lattice.
            None => return *point,
        };

        let n = self.num_control_points();
        let mut displacement = Vector::<D>::zeros();
        self.for_each_support_tap(&u, &base, |_, control, weight| {
            for d in 0..D {
                displacement[d] += weight * self.parameters[d * n + control];
            }
        });
        *point + displacement
    }

    fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn set_parameters(&mut self, parameters: &[f64]) {
        assert!(
            parameters.len() == self.parameters.len(),
            "Parameter length must match control grid"
        );
        self.parameters.copy_from_slice(parameters);
    }

    fn jacobian(&self, point: &Point<D>) -> DMatrix<f64> {
        let mut jacobian = DMatrix::zeros(D, self.parameter_count());
        let u = self.lattice_coordinates(point);
        if let Some(base) = self.support_base(&u) {
            let n = self.num_control_points();
            self.for_each_support_tap(&u, &base, |_, control, weight| {
                for d in 0..D {
                    jacobian[(d, d * n + control)] = weight;
                }
            });
        }
        jacobian
    }

    fn local_support(&self) -> Option<&dyn LocallySupported<D>> {
        Some(self)
    }
}

impl<const D: usize> LocallySupported<D> for BSplineTransform<D> {
    fn support_size(&self) -> usize {
        self.kernel.support().pow(D as u32)
    }

    fn transform_point_local(
        &self,
        point: &Point<D>,
        weights: &mut [f64],
        indices: &mut [usize],
    ) -> (Point<D>, bool) {
        let support = self.support_size();
        debug_assert!(weights.len() == support);
        debug_assert!(indices.len() == support * D);

        let u = self.lattice_coordinates(point);
        let base = match self.support_base(&u) {
            Some(base) => base,
            None => return (*point, false),
        };

        let n = self.num_control_points();
        let mut displacement = Vector::<D>::zeros();
        self.for_each_support_tap(&u, &base, |k, control, weight| {
            weights[k] = weight;
            for d in 0..D {
                displacement[d] += weight * self.parameters[d * n + control];
                indices[d * support + k] = d * n + control;
            }
        });
        (*point + displacement, true)
    }
}
