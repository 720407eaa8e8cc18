//! Interpolator trait for sampling values at continuous indices.

use crate::image::Image;
use crate::spatial::{Point, Vector};

/// Whether an interpolator can produce closed-form spatial derivatives.
///
/// Callers query this once when wiring components together and pick the
/// derivative path accordingly; interpolators without an analytic derivative
/// are paired with a finite-difference gradient computed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeCapability {
    /// No closed-form derivative; gradients must be estimated numerically.
    Numeric,
    /// The interpolation kernel has an analytic spatial derivative.
    Analytic,
}

/// Interpolator for sampling image values at continuous indices.
///
/// All coordinates are continuous indices; the caller converts physical
/// points beforehand. Evaluation clamps reads at the image border, so the
/// caller remains responsible for rejecting points outside the image's
/// defined domain (`Image::is_inside_buffer`).
pub trait Interpolator<const D: usize>: Send + Sync {
    /// Report whether this interpolator supports closed-form derivatives.
    fn derivative_capability(&self) -> DerivativeCapability {
        DerivativeCapability::Numeric
    }

    /// Interpolate the image value at a continuous index.
    fn evaluate(&self, image: &Image<D>, index: &Point<D>) -> f64;

    /// Interpolate value and spatial gradient at a continuous index.
    ///
    /// The gradient is returned in physical space. Returns `None` for
    /// interpolators with `DerivativeCapability::Numeric`.
    fn evaluate_with_derivative(
        &self,
        image: &Image<D>,
        index: &Point<D>,
    ) -> Option<(f64, Vector<D>)> {
        let _ = (image, index);
        None
    }
}
