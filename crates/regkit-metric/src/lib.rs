//! Metric-evaluation support core for image registration.
//!
//! Similarity metrics evaluate, per sampled fixed-image point, the
//! transformed point, the interpolated moving-image value and gradient, the
//! sparse set of transform parameters influencing that point, and an
//! optional differentiable mask weight. This crate provides those per-point
//! primitives plus the initialization logic that wires them up for a given
//! transform/interpolator pair; the concrete similarity formulas and the
//! optimizer live above it.

pub mod error;
pub mod gradient;
pub mod limiter;
pub mod mask;
pub mod metric;
pub mod sampler;
pub mod scratch;

pub use error::{MetricError, Result};
pub use gradient::ForwardDifferenceGradient;
pub use limiter::{
    compute_extrema, limit_bounds, ExponentialLimiter, HardLimiter, IntensityLimiter,
};
pub use mask::DifferentiableMask;
pub use metric::{AdvancedMetric, MetricConfig, MovingValue};
pub use sampler::{FullGridSampler, ImageSample, ImageSampler, RandomCoordinateSampler};
pub use scratch::{JacobianScratch, TransformJacobian};
