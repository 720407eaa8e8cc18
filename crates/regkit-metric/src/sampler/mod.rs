//! Fixed-image samplers.

pub mod grid;
pub mod random;
pub mod trait_;

pub use grid::FullGridSampler;
pub use random::RandomCoordinateSampler;
pub use trait_::{ImageSample, ImageSampler};
