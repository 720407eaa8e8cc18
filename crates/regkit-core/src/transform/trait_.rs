//! Transform traits, including the local-support capability query.

use nalgebra::DMatrix;

use crate::spatial::Point;

/// A parameterized spatial transform.
///
/// Maps points from fixed-image physical space to moving-image physical
/// space. Parameters are a flat slice so optimizers can treat every
/// transform uniformly.
pub trait Transform<const D: usize>: Send + Sync {
    /// Apply the transform to a point.
    fn transform_point(&self, point: &Point<D>) -> Point<D>;

    /// Total number of parameters.
    fn parameter_count(&self) -> usize;

    /// Current parameter values.
    fn parameters(&self) -> &[f64];

    /// Replace the parameter values.
    ///
    /// # Panics
    /// Panics if the slice length does not match `parameter_count`.
    fn set_parameters(&mut self, parameters: &[f64]);

    /// Dense Jacobian of the mapped point with respect to the parameters,
    /// a D × `parameter_count` matrix evaluated at `point`.
    fn jacobian(&self, point: &Point<D>) -> DMatrix<f64>;

    /// Capability query: the locally-supported view of this transform, if
    /// its output at a point depends on only a bounded local subset of the
    /// parameters.
    ///
    /// Wrapper transforms answer recursively for the stage that carries the
    /// optimized parameters, so composed transforms need no special-casing
    /// by callers.
    fn local_support(&self) -> Option<&dyn LocallySupported<D>> {
        None
    }
}

/// Per-point sparse evaluation for transforms with local support.
///
/// A locally-supported transform touches a fixed number of parameters per
/// point (the support size), independent of the total parameter count.
pub trait LocallySupported<const D: usize> {
    /// Number of basis weights contributing to one point.
    fn support_size(&self) -> usize;

    /// Length of the nonzero-parameter-index list for one point.
    fn num_nonzero_indices(&self) -> usize {
        self.support_size() * D
    }

    /// Map a point and fill the caller-provided scratch with the basis
    /// weights (`support_size` entries) and nonzero parameter indices
    /// (`num_nonzero_indices` entries) valid for that point.
    ///
    /// Returns the mapped point and whether the point lies inside the
    /// transform's support region. Outside the support region the scratch
    /// contents are unspecified and must not be consumed.
    fn transform_point_local(
        &self,
        point: &Point<D>,
        weights: &mut [f64],
        indices: &mut [usize],
    ) -> (Point<D>, bool);
}
