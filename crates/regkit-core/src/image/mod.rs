//! Image type and index regions.

pub mod image;
pub mod region;

pub use image::Image;
pub use region::Region;
