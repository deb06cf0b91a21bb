//! Index spaces.
//!
//! An [`IndexSpace`] is a rectangular region of an N-dimensional index space, defined by a start and a shape.
//! It is used to describe both the storage of data (an entire array, or one stored chunk of it) and the section of data wanted by a reader.
//! Index spaces are immutable, set-style operations return new index spaces.
//!
//! [`iterators`] includes an iterator over the indices of an index space.

pub mod iterators;

use std::{fmt::Display, ops::RangeInclusive};

use derive_more::From;
use itertools::izip;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ArrayIndices, ArrayShape};

use iterators::Indices;

/// A rectangular region of an N-dimensional index space.
///
/// The start may be negative, such as after a [`shift`](IndexSpace::shift) to the origin of another index space.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct IndexSpace {
    /// The start of the index space.
    start: ArrayIndices,
    /// The shape of the index space.
    shape: ArrayShape,
}

impl Display for IndexSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (start, size)) in std::iter::zip(&self.start, &self.shape).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", start, start + *size as i64 - 1)?;
        }
        write!(f, "]")
    }
}

impl IndexSpace {
    /// Create a new empty index space with dimensionality `rank`.
    #[must_use]
    pub fn new_empty(rank: usize) -> Self {
        Self {
            start: vec![0; rank],
            shape: vec![0; rank],
        }
    }

    /// Create a new index space from a list of inclusive ranges.
    ///
    /// A range with an end before its start has zero extent.
    #[must_use]
    pub fn new_with_ranges(ranges: &[RangeInclusive<i64>]) -> Self {
        let start = ranges.iter().map(|range| *range.start()).collect();
        let shape = ranges
            .iter()
            .map(|range| {
                if range.end() >= range.start() {
                    (range.end() - range.start() + 1) as u64
                } else {
                    0
                }
            })
            .collect();
        Self { start, shape }
    }

    /// Create a new index space with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new index space.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the lengths of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                shape.len(),
                start.len(),
            ))
        }
    }

    /// Create a new index space from a start and last (inclusive) index.
    ///
    /// A dimension with `last` one less than `start` has zero extent.
    ///
    /// # Errors
    /// Returns [`IncompatibleStartLastIndicesError`] if `start` and `last` differ in length or any element of `last` is less than `start - 1`.
    pub fn new_with_start_last(
        start: ArrayIndices,
        last: ArrayIndices,
    ) -> Result<Self, IncompatibleStartLastIndicesError> {
        if start.len() != last.len()
            || std::iter::zip(&start, &last).any(|(start, last)| *last < start - 1)
        {
            Err(IncompatibleStartLastIndicesError::from((start, last)))
        } else {
            let shape = std::iter::zip(&start, last)
                .map(|(&start, last)| (last - start + 1) as u64)
                .collect();
            Ok(Self { start, shape })
        }
    }

    /// Return the index space as a vec of inclusive ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<RangeInclusive<i64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..=start + size as i64 - 1)
            .collect()
    }

    /// Return the start of the index space.
    #[must_use]
    pub fn start(&self) -> &[i64] {
        &self.start
    }

    /// Return the shape of the index space.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the index space.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.start.len()
    }

    /// Return the last (inclusive) indices of the index space.
    ///
    /// The last index of a dimension with zero extent is one less than its start.
    #[must_use]
    pub fn last(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + *size as i64 - 1)
            .collect()
    }

    /// Return the end (exclusive) of the index space.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + *size as i64)
            .collect()
    }

    /// Return the number of elements of the index space.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        crate::num_elements(&self.shape)
    }

    /// Return the number of elements of the index space as a `usize`.
    ///
    /// # Panics
    ///
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Returns true if the index space contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|i| *i == 0)
    }

    /// Returns true if the index space contains `indices`.
    ///
    /// Returns false if the dimensionality of `indices` does not match.
    #[must_use]
    pub fn contains(&self, indices: &[i64]) -> bool {
        indices.len() == self.rank()
            && izip!(indices, &self.start, &self.shape)
                .all(|(&i, &start, &size)| i >= start && i < start + size as i64)
    }

    /// Returns true if `other` is entirely within this index space.
    ///
    /// Returns false if the dimensionality of `other` does not match.
    #[must_use]
    pub fn contains_space(&self, other: &IndexSpace) -> bool {
        other.rank() == self.rank()
            && izip!(&self.start, &self.shape, &other.start, &other.shape).all(
                |(&start, &size, &other_start, &other_size)| {
                    other_start >= start && other_start + other_size as i64 <= start + size as i64
                },
            )
    }

    /// Returns true if this index space and `other` share at least one element.
    ///
    /// Returns false if the dimensionality of `other` does not match.
    #[must_use]
    pub fn intersects(&self, other: &IndexSpace) -> bool {
        other.rank() == self.rank()
            && izip!(&self.start, &self.shape, &other.start, &other.shape).all(
                |(&start, &size, &other_start, &other_size)| {
                    std::cmp::max(start, other_start)
                        < std::cmp::min(start + size as i64, other_start + other_size as i64)
                },
            )
    }

    /// Return the intersection of this index space and `other`.
    ///
    /// The intersection may be empty: callers should check [`is_empty`](Self::is_empty) or [`num_elements`](Self::num_elements).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `other` does not match.
    pub fn intersect(&self, other: &IndexSpace) -> Result<Self, IncompatibleDimensionalityError> {
        if other.rank() == self.rank() {
            Ok(self.intersect_unchecked(other))
        } else {
            Err(IncompatibleDimensionalityError::new(
                other.rank(),
                self.rank(),
            ))
        }
    }

    pub(crate) fn intersect_unchecked(&self, other: &IndexSpace) -> Self {
        debug_assert_eq!(other.rank(), self.rank());
        let mut start = Vec::with_capacity(self.rank());
        let mut shape = Vec::with_capacity(self.rank());
        for (&self_start, &self_size, &other_start, &other_size) in
            izip!(&self.start, &self.shape, &other.start, &other.shape)
        {
            let first = std::cmp::max(self_start, other_start);
            let end = std::cmp::min(
                self_start + self_size as i64,
                other_start + other_size as i64,
            );
            start.push(first);
            shape.push(if end > first { (end - first) as u64 } else { 0 });
        }
        Self { start, shape }
    }

    /// Return the index space relative to `origin`.
    ///
    /// Creates an index space starting at [`IndexSpace::start()`] - `origin` with the same shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `origin` does not match the dimensionality of this index space.
    pub fn shift(&self, origin: &[i64]) -> Result<Self, IncompatibleDimensionalityError> {
        if origin.len() == self.rank() {
            Ok(self.shift_unchecked(origin))
        } else {
            Err(IncompatibleDimensionalityError::new(
                origin.len(),
                self.rank(),
            ))
        }
    }

    pub(crate) fn shift_unchecked(&self, origin: &[i64]) -> Self {
        debug_assert_eq!(origin.len(), self.rank());
        Self {
            start: std::iter::zip(&self.start, origin)
                .map(|(start, origin)| start - origin)
                .collect(),
            shape: self.shape.clone(),
        }
    }

    /// Bound the index space to the domain from the origin to `end` (exclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `end` does not match the dimensionality of this index space.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() == self.rank() {
            Ok(self.intersect_unchecked(&IndexSpace::new_with_shape(end.to_vec())))
        } else {
            Err(IncompatibleDimensionalityError::new(end.len(), self.rank()))
        }
    }

    /// Returns true if the index space is within the bounds of an index space at the origin with shape `array_shape`.
    #[must_use]
    pub fn inbounds_shape(&self, array_shape: &[u64]) -> bool {
        self.rank() == array_shape.len()
            && izip!(&self.start, &self.shape, array_shape)
                .all(|(&start, &size, &array_size)| start >= 0 && start as u64 + size <= array_size)
    }

    /// Returns an iterator over the indices of elements within the index space.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An incompatible index space and array shape error.
#[derive(Clone, Debug, Error, From)]
#[error("incompatible index space {0} with array shape {1:?}")]
pub struct IncompatibleIndexSpaceAndShapeError(IndexSpace, ArrayShape);

impl IncompatibleIndexSpaceAndShapeError {
    /// Create a new incompatible index space and shape error.
    #[must_use]
    pub fn new(index_space: IndexSpace, array_shape: ArrayShape) -> Self {
        Self(index_space, array_shape)
    }
}

/// An incompatible start/last indices error.
#[derive(Clone, Debug, Error, From)]
#[error("incompatible start {0:?} with last {1:?}")]
pub struct IncompatibleStartLastIndicesError(ArrayIndices, ArrayIndices);
