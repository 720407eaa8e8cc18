//! Image type with physical metadata and coordinate transformations.

use crate::spatial::{Direction, Point, Spacing, Vector};

use super::Region;

/// A D-dimensional scalar image with physical space metadata.
///
/// Pixel data is stored in a flat buffer in row-major order (axis 0 slowest,
/// axis D-1 fastest), addressed through precomputed strides. Origin, spacing
/// and direction describe how image indices map to physical coordinates.
///
/// # Coordinate Systems
/// * **Index Space**: Discrete pixel/voxel indices (integer coordinates)
/// * **Continuous Index Space**: Fractional indices, used by interpolators
/// * **Physical Space**: Continuous coordinates in mm or other units
#[derive(Debug, Clone, PartialEq)]
pub struct Image<const D: usize> {
    data: Vec<f64>,
    shape: [usize; D],
    strides: [usize; D],
    /// Physical coordinate of the first pixel (index 0, 0, ...).
    origin: Point<D>,
    /// Physical distance between pixels along each axis.
    spacing: Spacing<D>,
    /// Orientation of the image axes.
    direction: Direction<D>,
}

impl<const D: usize> Image<D> {
    /// Create a new image with the given data and metadata.
    ///
    /// # Panics
    /// Panics if the data length does not match the product of the shape.
    pub fn new(
        data: Vec<f64>,
        shape: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        let expected: usize = shape.iter().product();
        assert!(data.len() == expected, "Data length must match image shape");
        Self {
            data,
            shape,
            strides: Self::compute_strides(shape),
            origin,
            spacing,
            direction,
        }
    }

    /// Create an image by evaluating a function at every index.
    pub fn from_fn(
        shape: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
        f: impl Fn([usize; D]) -> f64,
    ) -> Self {
        let mut data = Vec::with_capacity(shape.iter().product());
        for index in Region::from_size(shape).indices() {
            data.push(f(index));
        }
        Self::new(data, shape, origin, spacing, direction)
    }

    /// Create a zero-filled image with default metadata (zero origin, unit
    /// spacing, identity direction).
    pub fn zeros(shape: [usize; D]) -> Self {
        let len = shape.iter().product();
        Self::new(
            vec![0.0; len],
            shape,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
        )
    }

    fn compute_strides(shape: [usize; D]) -> [usize; D] {
        let mut strides = [1usize; D];
        for d in (0..D.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }
        strides
    }

    /// Get the flat pixel buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable access to the flat pixel buffer.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Get the image shape.
    pub fn shape(&self) -> [usize; D] {
        self.shape
    }

    /// Get the origin (physical coordinate of first pixel).
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Get the spacing (physical distance between pixels).
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// The region covering the whole image extent.
    pub fn largest_region(&self) -> Region<D> {
        Region::from_size(self.shape)
    }

    /// Flat buffer offset of a discrete index.
    pub fn offset(&self, index: [usize; D]) -> usize {
        let mut offset = 0;
        for d in 0..D {
            debug_assert!(index[d] < self.shape[d], "Index out of bounds");
            offset += index[d] * self.strides[d];
        }
        offset
    }

    /// Pixel value at a discrete index.
    pub fn pixel(&self, index: [usize; D]) -> f64 {
        self.data[self.offset(index)]
    }

    /// Set the pixel value at a discrete index.
    pub fn set_pixel(&mut self, index: [usize; D], value: f64) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Pixel value at a discrete index with each component clamped to the
    /// valid range. Used by interpolators for border handling.
    pub fn pixel_clamped(&self, index: [isize; D]) -> f64 {
        let mut clamped = [0usize; D];
        for d in 0..D {
            clamped[d] = index[d].clamp(0, self.shape[d] as isize - 1) as usize;
        }
        self.pixel(clamped)
    }

    /// Check whether a continuous index lies within the image's defined
    /// continuous-index domain `[0, shape - 1]` along every axis.
    pub fn is_inside_buffer(&self, index: &Point<D>) -> bool {
        (0..D).all(|d| index[d] >= 0.0 && index[d] <= (self.shape[d] - 1) as f64)
    }

    /// Round a continuous index to the nearest discrete index, clamped to
    /// the image extent.
    pub fn nearest_index(&self, index: &Point<D>) -> [usize; D] {
        let mut nearest = [0usize; D];
        for d in 0..D {
            let rounded = index[d].round();
            nearest[d] = rounded.clamp(0.0, (self.shape[d] - 1) as f64) as usize;
        }
        nearest
    }

    /// Convert a physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let diff = *point - self.origin;
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("Direction matrix must be invertible");
        let rotated = inv_dir * diff;

        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point<D>) -> Point<D> {
        let mut scaled = Vector::<D>::zeros();
        for i in 0..D {
            scaled[i] = index[i] * self.spacing[i];
        }
        let rotated = self.direction * scaled;
        self.origin + rotated
    }

    /// Convert a discrete index to a physical point.
    pub fn transform_index_to_physical_point(&self, index: [usize; D]) -> Point<D> {
        let mut cindex = Point::<D>::origin();
        for d in 0..D {
            cindex[d] = index[d] as f64;
        }
        self.transform_continuous_index_to_physical_point(&cindex)
    }

    /// Push a gradient from continuous-index space into physical space.
    ///
    /// `g_phys = Direction^-T * (g_index / spacing)`
    pub fn index_gradient_to_physical(&self, gradient: &Vector<D>) -> Vector<D> {
        let mut scaled = Vector::<D>::zeros();
        for d in 0..D {
            scaled[d] = gradient[d] / self.spacing[d];
        }
        let inv_dir = self
            .direction
            .try_inverse()
            .expect("Direction matrix must be invertible");
        inv_dir.transpose() * scaled
    }
}
