//! Limiter trait.

/// Maps interpolated intensities into a bounded band.
///
/// A limiter carries two pairs of values: the true extrema of the image
/// (where limiting starts to act) and the hard bounds the output never
/// exceeds. Both are installed through [`set_range`](Self::set_range) during
/// metric initialization.
pub trait IntensityLimiter: Send + Sync {
    /// Install the true intensity extrema and the output bounds.
    ///
    /// `true_min <= true_max` and `min_limit <= true_min`,
    /// `max_limit >= true_max` are expected; values between the extrema pass
    /// through unchanged.
    fn set_range(&mut self, true_min: f64, true_max: f64, min_limit: f64, max_limit: f64);

    /// Limit a single value.
    fn limit(&self, value: f64) -> f64;

    /// Limit a value and return `(limited, d limited / d value)`.
    ///
    /// The second component is the chain-rule factor to multiply into the
    /// image gradient at the same point.
    fn limit_with_derivative(&self, value: f64) -> (f64, f64);
}
