//! The odometer.
//!
//! An [`Odometer`] is a cursor over an [`IndexSpace`] embedded in a larger array shape (the datashape).
//! It converts the cursor to and from a linearised element of the datashape, and steps through the index space in row-major order like a mixed-radix counter.

use std::iter::FusedIterator;

use crate::{
    index_space::{IncompatibleIndexSpaceAndShapeError, IndexSpace},
    ArrayIndices,
};

/// A cursor over an index space embedded in an array shape.
///
/// The cursor starts at the start of the section.
#[derive(Clone, Debug)]
pub struct Odometer {
    section: IndexSpace,
    last: ArrayIndices,
    stride: Vec<u64>,
    current: ArrayIndices,
}

impl Odometer {
    /// Create a new odometer over `section` within an array of shape `datashape`.
    ///
    /// `datashape` may have more dimensions than `section`, the extra trailing dimensions are ignored.
    ///
    /// # Errors
    /// Returns [`IncompatibleIndexSpaceAndShapeError`] if `datashape` has fewer dimensions than `section` or `section` is not within the bounds of `datashape`.
    pub fn new(
        section: IndexSpace,
        datashape: &[u64],
    ) -> Result<Self, IncompatibleIndexSpaceAndShapeError> {
        let rank = section.rank();
        if datashape.len() < rank || !section.inbounds_shape(&datashape[..rank]) {
            return Err(IncompatibleIndexSpaceAndShapeError::new(
                section,
                datashape.to_vec(),
            ));
        }
        Ok(Self::new_unchecked(section, &datashape[..rank]))
    }

    pub(crate) fn new_unchecked(section: IndexSpace, datashape: &[u64]) -> Self {
        let rank = section.rank();
        debug_assert!(datashape.len() >= rank);
        let mut stride = vec![1; rank];
        for k in (0..rank.saturating_sub(1)).rev() {
            stride[k] = stride[k + 1] * datashape[k + 1];
        }
        Self {
            last: section.last(),
            current: section.start().to_vec(),
            section,
            stride,
        }
    }

    /// Return the section of the odometer.
    #[must_use]
    pub fn section(&self) -> &IndexSpace {
        &self.section
    }

    /// Return the row-major strides of the datashape.
    #[must_use]
    pub fn stride(&self) -> &[u64] {
        &self.stride
    }

    /// Return the current indices of the cursor.
    #[must_use]
    pub fn current(&self) -> &[i64] {
        &self.current
    }

    /// Return the dimensionality of the odometer.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.current.len()
    }

    /// Return the linearised element of the cursor within the datashape.
    #[must_use]
    pub fn element(&self) -> u64 {
        std::iter::zip(&self.current, &self.stride)
            .map(|(&index, stride)| index as u64 * stride)
            .sum()
    }

    /// Set the cursor to the linearised `element` of the datashape and return the new indices.
    ///
    /// The cursor is unchanged if the datashape has no elements.
    pub fn set(&mut self, mut element: u64) -> &[i64] {
        if self.stride.contains(&0) {
            return &self.current;
        }
        for (index, stride) in std::iter::zip(&mut self.current, &self.stride) {
            *index = (element / stride) as i64;
            element %= stride;
        }
        &self.current
    }

    /// Increment `digit` of the cursor.
    ///
    /// A digit that passes the last index of the section wraps back to the section start and carries into the next slower digit.
    /// Digit 0 never wraps, so the cursor may move past the end of the section.
    ///
    /// # Panics
    /// Panics if `digit` is not less than the dimensionality of the odometer.
    pub fn incr_digit(&mut self, digit: usize) {
        assert!(
            digit < self.rank(),
            "digit {digit} out of range for odometer of rank {}",
            self.rank()
        );
        let mut digit = digit;
        loop {
            self.current[digit] += 1;
            if digit == 0 || self.current[digit] <= self.last[digit] {
                break;
            }
            self.current[digit] = self.section.start()[digit];
            digit -= 1;
        }
    }

    /// Increment the fastest varying digit of the cursor.
    ///
    /// Does nothing for a rank 0 odometer.
    pub fn incr(&mut self) {
        if let Some(digit) = self.rank().checked_sub(1) {
            self.incr_digit(digit);
        }
    }
}

impl IntoIterator for Odometer {
    type Item = ArrayIndices;
    type IntoIter = OdometerIterator;

    fn into_iter(self) -> Self::IntoIter {
        OdometerIterator {
            remaining: self.section.num_elements(),
            odometer: self,
        }
    }
}

/// An iterator over every index of an odometer section in row-major order.
///
/// Created with [`Odometer::into_iter`].
/// Starts from the current position of the odometer and yields exactly as many indices as the section has elements.
pub struct OdometerIterator {
    odometer: Odometer,
    remaining: u64,
}

impl OdometerIterator {
    /// Return the linearised element of the next indices to be yielded.
    #[must_use]
    pub fn element(&self) -> u64 {
        self.odometer.element()
    }
}

impl Iterator for OdometerIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let indices = self.odometer.current.clone();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.odometer.incr();
        }
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for OdometerIterator {}

impl FusedIterator for OdometerIterator {}
