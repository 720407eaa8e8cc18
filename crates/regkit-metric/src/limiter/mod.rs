//! Intensity limiters for bounding interpolated gray values.
//!
//! Interpolation (cubic B-spline in particular) can overshoot the true
//! intensity range of an image. Limiters map interpolated values back into a
//! configured band and report the chain-rule factor so gradients stay
//! consistent with the limited values.

pub mod exponential;
pub mod extrema;
pub mod hard;
pub mod trait_;

pub use exponential::ExponentialLimiter;
pub use extrema::{compute_extrema, limit_bounds};
pub use hard::HardLimiter;
pub use trait_::IntensityLimiter;
