//! Spatial transforms mapping fixed-image points to moving-image points.

pub mod bspline;
pub mod combination;
pub mod trait_;
pub mod translation;

pub use bspline::BSplineTransform;
pub use combination::CombinationTransform;
pub use trait_::{LocallySupported, Transform};
pub use translation::TranslationTransform;
