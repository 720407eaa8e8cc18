//! B-spline basis kernels of order 0 through 3.
//!
//! One kernel type serves the B-spline interpolator, the B-spline transform
//! and the differentiable-mask resampler, which each need a configurable
//! spline order with an analytic first derivative.

/// Piecewise-polynomial B-spline basis function of a given order.
///
/// The kernel of order n has support width n+1 and is C^(n-1) continuous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BSplineKernel {
    order: usize,
}

impl BSplineKernel {
    /// Create a kernel of the given order (0 through 3).
    ///
    /// # Panics
    /// Panics for orders above 3.
    pub fn new(order: usize) -> Self {
        assert!(order <= 3, "B-spline kernel orders above 3 are not supported");
        Self { order }
    }

    /// Cubic kernel, the default for image interpolation.
    pub fn cubic() -> Self {
        Self::new(3)
    }

    /// The spline order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of taps contributing to one evaluation.
    pub fn support(&self) -> usize {
        self.order + 1
    }

    /// First integer tap for an evaluation at continuous coordinate `x`.
    ///
    /// The taps `first..first + support` cover the kernel's support around
    /// `x` for every order.
    pub fn first_tap(&self, x: f64) -> isize {
        (x - 0.5 * (self.order as f64 + 1.0)).ceil() as isize
    }

    /// Evaluate the basis function at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let a = x.abs();
        match self.order {
            0 => {
                // Closed on the left tap so half-integer coordinates still
                // see exactly one contributing tap.
                if a <= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            1 => {
                if a < 1.0 {
                    1.0 - a
                } else {
                    0.0
                }
            }
            2 => {
                if a < 0.5 {
                    0.75 - a * a
                } else if a < 1.5 {
                    0.5 * (a - 1.5) * (a - 1.5)
                } else {
                    0.0
                }
            }
            _ => {
                if a < 1.0 {
                    (2.0 / 3.0) - a * a + 0.5 * a * a * a
                } else if a < 2.0 {
                    let t = 2.0 - a;
                    (1.0 / 6.0) * t * t * t
                } else {
                    0.0
                }
            }
        }
    }

    /// Evaluate the first derivative of the basis function at `x`.
    ///
    /// The order-0 kernel is piecewise constant; its derivative is reported
    /// as zero everywhere.
    pub fn derivative(&self, x: f64) -> f64 {
        let a = x.abs();
        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        match self.order {
            0 => 0.0,
            1 => {
                if a < 1.0 {
                    -sign
                } else {
                    0.0
                }
            }
            2 => {
                if a < 0.5 {
                    -2.0 * x
                } else if a < 1.5 {
                    sign * (a - 1.5)
                } else {
                    0.0
                }
            }
            _ => {
                if a < 1.0 {
                    sign * (-2.0 * a + 1.5 * a * a)
                } else if a < 2.0 {
                    let t = 2.0 - a;
                    sign * (-0.5 * t * t)
                } else {
                    0.0
                }
            }
        }
    }
}
