//! Interpolators for sampling image values at continuous indices.

pub mod bspline;
pub mod kernel;
pub mod linear;
pub mod nearest;
pub mod trait_;

pub use bspline::BSplineInterpolator;
pub use kernel::BSplineKernel;
pub use linear::LinearInterpolator;
pub use nearest::NearestNeighborInterpolator;
pub use trait_::{DerivativeCapability, Interpolator};
