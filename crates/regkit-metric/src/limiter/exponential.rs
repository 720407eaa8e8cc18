//! Smooth exponential limiter.

use super::trait_::IntensityLimiter;

/// Smoothly saturates values toward the configured bounds.
///
/// Values between the true extrema pass through unchanged. Beyond an
/// extremum `t` with bound `b` and headroom `a = |b - t|`, the output
/// approaches `b` exponentially:
///
/// `limit(v) = b - a * exp(-(v - t) / a)` for `v > t` (high side),
///
/// and symmetrically on the low side. The derivative of this map is the
/// same exponential, so the chain factor decays from 1 at the extremum to
/// 0 at infinity and the limited value stays differentiable everywhere.
/// With zero headroom the limiter degenerates to a hard clamp.
#[derive(Debug, Clone)]
pub struct ExponentialLimiter {
    true_min: f64,
    true_max: f64,
    min_limit: f64,
    max_limit: f64,
}

impl ExponentialLimiter {
    pub fn new() -> Self {
        Self {
            true_min: f64::NEG_INFINITY,
            true_max: f64::INFINITY,
            min_limit: f64::NEG_INFINITY,
            max_limit: f64::INFINITY,
        }
    }
}

impl Default for ExponentialLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntensityLimiter for ExponentialLimiter {
    fn set_range(&mut self, true_min: f64, true_max: f64, min_limit: f64, max_limit: f64) {
        self.true_min = true_min;
        self.true_max = true_max;
        self.min_limit = min_limit;
        self.max_limit = max_limit;
    }

    fn limit(&self, value: f64) -> f64 {
        self.limit_with_derivative(value).0
    }

    fn limit_with_derivative(&self, value: f64) -> (f64, f64) {
        if value > self.true_max {
            let headroom = self.max_limit - self.true_max;
            if headroom <= 0.0 {
                return (self.max_limit, 0.0);
            }
            let factor = (-(value - self.true_max) / headroom).exp();
            (self.max_limit - headroom * factor, factor)
        } else if value < self.true_min {
            let headroom = self.true_min - self.min_limit;
            if headroom <= 0.0 {
                return (self.min_limit, 0.0);
            }
            let factor = (-(self.true_min - value) / headroom).exp();
            (self.min_limit + headroom * factor, factor)
        } else {
            (value, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ExponentialLimiter {
        let mut limiter = ExponentialLimiter::new();
        // True range [0, 100], 1% headroom on each side.
        limiter.set_range(0.0, 100.0, -1.0, 101.0);
        limiter
    }

    #[test]
    fn test_inside_range_is_identity() {
        let limiter = configured();
        assert_eq!(limiter.limit_with_derivative(50.0), (50.0, 1.0));
        assert_eq!(limiter.limit_with_derivative(0.0), (0.0, 1.0));
        assert_eq!(limiter.limit_with_derivative(100.0), (100.0, 1.0));
    }

    #[test]
    fn test_continuity_at_extremum() {
        let limiter = configured();
        let (just_inside, _) = limiter.limit_with_derivative(100.0);
        let (just_outside, factor) = limiter.limit_with_derivative(100.0 + 1e-9);
        assert!((just_outside - just_inside).abs() < 1e-8);
        assert!((factor - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_output_never_exceeds_bounds() {
        let limiter = configured();
        for v in [101.0, 150.0, 1e6, -2.0, -1e6] {
            let limited = limiter.limit(v);
            assert!(limited <= 101.0);
            assert!(limited >= -1.0);
        }
        // Far outside, the output saturates at the bound.
        assert!((limiter.limit(1e9) - 101.0).abs() < 1e-9);
        assert!((limiter.limit(-1e9) - (-1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let limiter = configured();
        let h = 1e-6;
        for v in [100.3, 100.9, -0.4, -0.9] {
            let (_, analytic) = limiter.limit_with_derivative(v);
            let numeric = (limiter.limit(v + h) - limiter.limit(v - h)) / (2.0 * h);
            assert!(
                (analytic - numeric).abs() < 1e-5,
                "derivative mismatch at {v}: {analytic} vs {numeric}"
            );
        }
    }

    #[test]
    fn test_monotonicity_outside_range() {
        let limiter = configured();
        let mut prev = limiter.limit(100.0);
        for k in 1..200 {
            let v = 100.0 + 0.05 * k as f64;
            let cur = limiter.limit(v);
            assert!(cur >= prev, "limiter not monotonic at {v}");
            prev = cur;
        }
    }

    #[test]
    fn test_zero_headroom_degenerates_to_clamp() {
        let mut limiter = ExponentialLimiter::new();
        limiter.set_range(0.0, 100.0, 0.0, 100.0);
        assert_eq!(limiter.limit_with_derivative(150.0), (100.0, 0.0));
        assert_eq!(limiter.limit_with_derivative(-50.0), (0.0, 0.0));
    }
}
