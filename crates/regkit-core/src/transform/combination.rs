//! Combination transform: a fixed initial stage composed with an optimized
//! current stage.

use nalgebra::DMatrix;

use crate::spatial::Point;

use super::trait_::{LocallySupported, Transform};

/// Two-stage transform `T(x) = current(initial(x))`.
///
/// The initial stage is held fixed (typically a rigid or affine
/// pre-alignment) while only the current stage is parameterized and
/// optimized. Parameters and Jacobians therefore refer to the current
/// stage alone.
///
/// Local support is answered recursively: when the current stage is
/// locally supported (directly or through further nesting), the
/// combination is too, with weights evaluated at the pre-mapped point.
pub struct CombinationTransform<const D: usize> {
    initial: Box<dyn Transform<D>>,
    current: Box<dyn Transform<D>>,
}

impl<const D: usize> CombinationTransform<D> {
    /// Create a combination of a fixed initial stage and an optimized
    /// current stage.
    pub fn new(initial: Box<dyn Transform<D>>, current: Box<dyn Transform<D>>) -> Self {
        Self { initial, current }
    }

    /// The fixed initial stage.
    pub fn initial(&self) -> &dyn Transform<D> {
        self.initial.as_ref()
    }

    /// The optimized current stage.
    pub fn current(&self) -> &dyn Transform<D> {
        self.current.as_ref()
    }
}

impl<const D: usize> Transform<D> for CombinationTransform<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        let intermediate = self.initial.transform_point(point);
        self.current.transform_point(&intermediate)
    }

    fn parameter_count(&self) -> usize {
        self.current.parameter_count()
    }

    fn parameters(&self) -> &[f64] {
        self.current.parameters()
    }

    fn set_parameters(&mut self, parameters: &[f64]) {
        self.current.set_parameters(parameters);
    }

    fn jacobian(&self, point: &Point<D>) -> DMatrix<f64> {
        let intermediate = self.initial.transform_point(point);
        self.current.jacobian(&intermediate)
    }

    fn local_support(&self) -> Option<&dyn LocallySupported<D>> {
        self.current.local_support().map(|_| self as &dyn LocallySupported<D>)
    }
}

impl<const D: usize> LocallySupported<D> for CombinationTransform<D> {
    fn support_size(&self) -> usize {
        match self.current.local_support() {
            Some(local) => local.support_size(),
            None => 0,
        }
    }

    fn transform_point_local(
        &self,
        point: &Point<D>,
        weights: &mut [f64],
        indices: &mut [usize],
    ) -> (Point<D>, bool) {
        let intermediate = self.initial.transform_point(point);
        match self.current.local_support() {
            Some(local) => local.transform_point_local(&intermediate, weights, indices),
            // Only reachable when called without consulting local_support().
            None => (self.current.transform_point(&intermediate), false),
        }
    }
}
