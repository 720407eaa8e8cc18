//! Hard clamping limiter.

use super::trait_::IntensityLimiter;

/// Clamps values to the configured bounds.
///
/// The derivative factor is 1 strictly inside the bounds and 0 outside,
/// so gradients of clamped samples are zeroed.
#[derive(Debug, Clone)]
pub struct HardLimiter {
    min_limit: f64,
    max_limit: f64,
}

impl HardLimiter {
    pub fn new() -> Self {
        Self {
            min_limit: f64::NEG_INFINITY,
            max_limit: f64::INFINITY,
        }
    }
}

impl Default for HardLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntensityLimiter for HardLimiter {
    fn set_range(&mut self, _true_min: f64, _true_max: f64, min_limit: f64, max_limit: f64) {
        self.min_limit = min_limit;
        self.max_limit = max_limit;
    }

    fn limit(&self, value: f64) -> f64 {
        value.clamp(self.min_limit, self.max_limit)
    }

    fn limit_with_derivative(&self, value: f64) -> (f64, f64) {
        if value > self.max_limit {
            (self.max_limit, 0.0)
        } else if value < self.min_limit {
            (self.min_limit, 0.0)
        } else {
            (value, 1.0)
        }
    }
}
