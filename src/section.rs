//! Section specifications.
//!
//! A [`Section`] is a Fortran-90 style array section specification such as `"(1:20,:,3,10:20:2)"`, with one selector per dimension:
//!  - `:`: all indices of the dimension,
//!  - `n`: the single index `n`,
//!  - `a:b`: the indices from `a` to `b` inclusive, and
//!  - `a:b:s`: the indices from `a` to `b` inclusive with stride `s`.
//!
//! The parentheses are optional.
//! [`Section::fill`] resolves `:` selectors against an array shape, giving a [`FilledSection`] whose [`index_space`](FilledSection::index_space) can be read.

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    index_space::{IncompatibleDimensionalityError, IndexSpace},
    ArrayShape,
};

/// A range of indices with a stride.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StridedRange {
    first: u64,
    length: u64,
    stride: u64,
}

impl StridedRange {
    /// Create a new strided range from `first` to `last` inclusive.
    ///
    /// # Errors
    /// Returns [`InvalidSectionError::InvalidRange`] if `last` is less than `first` or `stride` is zero.
    pub fn new(first: u64, last: u64, stride: u64) -> Result<Self, InvalidSectionError> {
        if last < first || stride == 0 {
            return Err(InvalidSectionError::InvalidRange(first, last, stride));
        }
        Ok(Self {
            first,
            length: (last - first) / stride + 1,
            stride,
        })
    }

    /// Create a new range with `length` consecutive indices from `first`.
    #[must_use]
    pub fn new_with_length(first: u64, length: u64) -> Self {
        Self {
            first,
            length,
            stride: 1,
        }
    }

    /// Return the first index.
    #[must_use]
    pub fn first(&self) -> u64 {
        self.first
    }

    /// Return the last index, or [`None`] if the range is empty.
    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.length
            .checked_sub(1)
            .map(|steps| self.first + steps * self.stride)
    }

    /// Return the stride.
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Return the number of indices.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Return the number of indices from the first to the last index, ignoring the stride.
    #[must_use]
    pub fn extent(&self) -> u64 {
        self.last().map_or(0, |last| last - self.first + 1)
    }
}

impl Display for StridedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = self.first as i64 + self.extent() as i64 - 1;
        if self.stride == 1 {
            write!(f, "{}:{}", self.first, last)
        } else {
            write!(f, "{}:{}:{}", self.first, last, self.stride)
        }
    }
}

/// A section parse error.
#[derive(Clone, Debug, Error)]
#[error("illegal selector {1:?} in section {0:?}")]
pub struct SectionParseError(String, String);

/// An invalid section error.
#[derive(Copy, Clone, Debug, Error)]
pub enum InvalidSectionError {
    /// A range has a last index before its first index or a zero stride.
    #[error("invalid range {0}:{1}:{2}")]
    InvalidRange(u64, u64, u64),
    /// The section does not match the dimensionality of the array.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The last index of a range is beyond the array shape.
    #[error("range of dimension {0} with last index {1} is out of bounds of size {2}")]
    OutOfBounds(usize, u64, u64),
}

/// A section specification, with [`None`] for the `:` selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Section(Vec<Option<StridedRange>>);

impl Section {
    /// Create a new section from `ranges`, where [`None`] selects all indices of a dimension.
    #[must_use]
    pub fn new(ranges: Vec<Option<StridedRange>>) -> Self {
        Self(ranges)
    }

    /// Return the ranges of the section.
    #[must_use]
    pub fn ranges(&self) -> &[Option<StridedRange>] {
        &self.0
    }

    /// Return the dimensionality of the section.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Resolve the section against an array with shape `var_shape`.
    ///
    /// # Errors
    /// Returns an [`InvalidSectionError`] if the dimensionality does not match `var_shape` or a range is out of bounds.
    pub fn fill(&self, var_shape: &[u64]) -> Result<FilledSection, InvalidSectionError> {
        if self.rank() != var_shape.len() {
            return Err(IncompatibleDimensionalityError::new(self.rank(), var_shape.len()).into());
        }
        std::iter::zip(&self.0, var_shape)
            .enumerate()
            .map(|(dim, (range, &size))| match range {
                None => Ok(StridedRange::new_with_length(0, size)),
                Some(range) => match range.last() {
                    Some(last) if last >= size => {
                        Err(InvalidSectionError::OutOfBounds(dim, last, size))
                    }
                    _ => Ok(*range),
                },
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FilledSection)
    }
}

impl FromStr for Section {
    type Err = SectionParseError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let parse_error = |selector: &str| SectionParseError(spec.to_string(), selector.to_string());
        let parse_index = |selector: &str, index: &str| {
            index.trim().parse::<u64>().map_err(|_| parse_error(selector))
        };
        spec.split(['(', ')', ','])
            .map(str::trim)
            .filter(|selector| !selector.is_empty())
            .map(|selector| {
                if selector == ":" {
                    return Ok(None);
                }
                let parts: Vec<_> = selector.split(':').collect();
                let range = match *parts.as_slice() {
                    [index] => {
                        let index = parse_index(selector, index)?;
                        StridedRange::new(index, index, 1)
                    }
                    [first, last] => StridedRange::new(
                        parse_index(selector, first)?,
                        parse_index(selector, last)?,
                        1,
                    ),
                    [first, last, stride] => StridedRange::new(
                        parse_index(selector, first)?,
                        parse_index(selector, last)?,
                        parse_index(selector, stride)?,
                    ),
                    _ => return Err(parse_error(selector)),
                };
                range.map(Some).map_err(|_| parse_error(selector))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Section)
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ranges = self.0.iter().format_with(",", |range, f| match range {
            Some(range) => f(range),
            None => f(&":"),
        });
        write!(f, "{ranges}")
    }
}

/// A section resolved against an array shape.
///
/// Created with [`Section::fill`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilledSection(Vec<StridedRange>);

impl FilledSection {
    /// Return the ranges of the section.
    #[must_use]
    pub fn ranges(&self) -> &[StridedRange] {
        &self.0
    }

    /// Return the dimensionality of the section.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Return the shape of the section, the number of strided indices in each dimension.
    #[must_use]
    pub fn shape(&self) -> ArrayShape {
        self.0.iter().map(StridedRange::length).collect()
    }

    /// Return the number of elements of the section.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(StridedRange::length).product()
    }

    /// Returns true if any range has a stride greater than one.
    #[must_use]
    pub fn is_strided(&self) -> bool {
        self.0.iter().any(|range| range.stride() > 1)
    }

    /// Return the index space covering the section.
    ///
    /// Strides are ignored, the index space spans each range from its first to its last index.
    #[must_use]
    pub fn index_space(&self) -> IndexSpace {
        let ranges: Vec<_> = self
            .0
            .iter()
            .map(|range| {
                let first = range.first() as i64;
                first..=first + range.extent() as i64 - 1
            })
            .collect();
        IndexSpace::new_with_ranges(&ranges)
    }
}

impl Display for FilledSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().format(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_parse() {
        let section: Section = "(1:20,:,3,10:20:2)".parse().unwrap();
        assert_eq!(section.rank(), 4);
        assert_eq!(section.ranges()[0], Some(StridedRange::new(1, 20, 1).unwrap()));
        assert_eq!(section.ranges()[1], None);
        assert_eq!(section.ranges()[2], Some(StridedRange::new(3, 3, 1).unwrap()));
        assert_eq!(section.ranges()[3].unwrap().length(), 6);
        assert_eq!(section.to_string(), "1:20,:,3:3,10:20:2");

        let section: Section = " 0:1 , 5:9 ".parse().unwrap();
        assert_eq!(section.to_string(), "0:1,5:9");
    }

    #[test]
    fn section_parse_errors() {
        assert!("1:x".parse::<Section>().is_err());
        assert!("5:3".parse::<Section>().is_err());
        assert!("1:2:0".parse::<Section>().is_err());
        assert!("1:2:3:4".parse::<Section>().is_err());
        assert!("-1:2".parse::<Section>().is_err());
        let err = "(1:2,a)".parse::<Section>().unwrap_err();
        assert_eq!(err.to_string(), r#"illegal selector "a" in section "(1:2,a)""#);
    }

    #[test]
    fn section_fill() {
        let section: Section = "(1:20,:,3,10:20:2)".parse().unwrap();
        let filled = section.fill(&[30, 5, 4, 21]).unwrap();
        assert_eq!(filled.shape(), vec![20, 5, 1, 6]);
        assert_eq!(filled.num_elements(), 600);
        assert!(filled.is_strided());
        assert_eq!(
            filled.index_space(),
            IndexSpace::new_with_ranges(&[1..=20, 0..=4, 3..=3, 10..=20])
        );
        assert_eq!(filled.to_string(), "1:20,0:4,3:3,10:20:2");

        assert!(matches!(
            section.fill(&[30, 5, 4]),
            Err(InvalidSectionError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            section.fill(&[20, 5, 4, 21]),
            Err(InvalidSectionError::OutOfBounds(0, 20, 20))
        ));
    }

    #[test]
    fn section_fill_empty_dimension() {
        let section: Section = ":,0:1".parse().unwrap();
        let filled = section.fill(&[0, 2]).unwrap();
        assert_eq!(filled.num_elements(), 0);
        assert!(filled.index_space().is_empty());
        assert_eq!(filled.to_string(), "0:-1,0:1");
    }
}
