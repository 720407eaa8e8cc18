//! Translation transform.

use nalgebra::DMatrix;

use crate::spatial::{Point, Vector};

use super::trait_::Transform;

/// Translation transform: `T(x) = x + t`.
///
/// The simplest dense transform; every parameter influences every point,
/// so there is no local support.
#[derive(Debug, Clone)]
pub struct TranslationTransform<const D: usize> {
    parameters: Vec<f64>,
}

impl<const D: usize> TranslationTransform<D> {
    /// Create an identity translation.
    pub fn identity() -> Self {
        Self { parameters: vec![0.0; D] }
    }

    /// Create a translation by the given offset.
    pub fn new(offset: Vector<D>) -> Self {
        Self { parameters: offset.to_vec() }
    }

    /// The current offset.
    pub fn offset(&self) -> Vector<D> {
        Vector::from_slice(&self.parameters)
    }
}

impl<const D: usize> Default for TranslationTransform<D> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<const D: usize> Transform<D> for TranslationTransform<D> {
    fn transform_point(&self, point: &Point<D>) -> Point<D> {
        *point + self.offset()
    }

    fn parameter_count(&self) -> usize {
        D
    }

    fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    fn set_parameters(&mut self, parameters: &[f64]) {
        assert!(parameters.len() == D, "Parameter length must match dimension");
        self.parameters.copy_from_slice(parameters);
    }

    fn jacobian(&self, _point: &Point<D>) -> DMatrix<f64> {
        DMatrix::identity(D, D)
    }
}
