//! Index regions: rectangular blocks of discrete image indices.

/// A rectangular block of image indices, described by a start index and a size.
///
/// Regions delimit where an operation reads pixels: the fixed image's
/// requested region for sampling and extrema scans, or an image's full
/// extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<const D: usize> {
    index: [usize; D],
    size: [usize; D],
}

impl<const D: usize> Region<D> {
    /// Create a new region from a start index and a size.
    pub fn new(index: [usize; D], size: [usize; D]) -> Self {
        Self { index, size }
    }

    /// Create a region starting at the zero index.
    pub fn from_size(size: [usize; D]) -> Self {
        Self { index: [0; D], size }
    }

    /// Get the start index.
    pub fn index(&self) -> [usize; D] {
        self.index
    }

    /// Get the size along each axis.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Total number of indices contained in the region.
    pub fn num_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// Check whether a discrete index lies inside the region.
    pub fn contains(&self, index: [usize; D]) -> bool {
        (0..D).all(|d| index[d] >= self.index[d] && index[d] < self.index[d] + self.size[d])
    }

    /// Check whether this region fits inside another region.
    pub fn is_inside(&self, other: &Region<D>) -> bool {
        (0..D).all(|d| {
            self.index[d] >= other.index[d]
                && self.index[d] + self.size[d] <= other.index[d] + other.size[d]
        })
    }

    /// Iterate over all indices in the region, axis 0 slowest.
    pub fn indices(&self) -> RegionIndices<D> {
        RegionIndices {
            region: *self,
            next: self.index,
            remaining: self.num_pixels(),
        }
    }
}

/// Iterator over the indices of a region, axis 0 slowest (row-major).
#[derive(Debug, Clone)]
pub struct RegionIndices<const D: usize> {
    region: Region<D>,
    next: [usize; D],
    remaining: usize,
}

impl<const D: usize> Iterator for RegionIndices<D> {
    type Item = [usize; D];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;

        // Odometer increment, last axis fastest.
        for d in (0..D).rev() {
            self.next[d] += 1;
            if self.next[d] < self.region.index[d] + self.region.size[d] {
                break;
            }
            self.next[d] = self.region.index[d];
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const D: usize> ExactSizeIterator for RegionIndices<D> {}
