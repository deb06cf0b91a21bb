use std::iter::FusedIterator;

use crate::{index_space::IndexSpace, ArrayIndices};

use rayon::iter::{
    plumbing::{bridge, Consumer, Producer, ProducerCallback, UnindexedConsumer},
    IndexedParallelIterator, IntoParallelIterator, ParallelIterator,
};

/// An iterator over the indices in an index space.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// For example, consider a 4x3 array with element indices
/// ```text
/// (0, 0)  (0, 1)  (0, 2)
/// (1, 0)  (1, 1)  (1, 2)
/// (2, 0)  (2, 1)  (2, 2)
/// (3, 0)  (3, 1)  (3, 2)
/// ```
/// An iterator with an index space corresponding to the lower right 2x2 region will produce `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
#[derive(Clone, Debug)]
pub struct Indices {
    space: IndexSpace,
    length: usize,
}

impl Indices {
    /// Create a new indices struct.
    ///
    /// # Panics
    /// Panics if the number of elements in `space` exceeds [`usize::MAX`].
    #[must_use]
    pub fn new(space: IndexSpace) -> Self {
        let length = space.num_elements_usize();
        Self { space, length }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new_with_start_end(&self.space, 0, self.length as u64)
    }
}

impl<'a> IntoParallelIterator for &'a Indices {
    type Item = ArrayIndices;
    type Iter = ParIndicesIterator<'a>;

    fn into_par_iter(self) -> Self::Iter {
        ParIndicesIterator {
            space: &self.space,
            index_front: 0,
            index_back: self.length as u64,
        }
    }
}

/// Convert an element offset within `space` to its indices.
fn space_indices(space: &IndexSpace, mut element: u64) -> ArrayIndices {
    let mut indices = vec![0; space.rank()];
    for (index, &start, &size) in itertools::izip!(
        indices.iter_mut().rev(),
        space.start().iter().rev(),
        space.shape().iter().rev()
    ) {
        *index = start + (element % size) as i64;
        element /= size;
    }
    indices
}

/// Serial indices iterator.
///
/// See [`Indices`].
pub struct IndicesIterator<'a> {
    space: &'a IndexSpace,
    index_front: u64,
    index_back: u64,
}

impl<'a> IndicesIterator<'a> {
    fn new_with_start_end(space: &'a IndexSpace, index_front: u64, index_back: u64) -> Self {
        debug_assert!(index_front <= index_back);
        Self {
            space,
            index_front,
            index_back,
        }
    }
}

impl Iterator for IndicesIterator<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let indices = space_indices(self.space, self.index_front);
            self.index_front += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = usize::try_from(self.index_back - self.index_front).unwrap_or(usize::MAX);
        (length, Some(length))
    }
}

impl DoubleEndedIterator for IndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(space_indices(self.space, self.index_back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for IndicesIterator<'_> {}

impl FusedIterator for IndicesIterator<'_> {}

/// Parallel indices iterator.
///
/// See [`Indices`].
pub struct ParIndicesIterator<'a> {
    space: &'a IndexSpace,
    index_front: u64,
    index_back: u64,
}

impl ParallelIterator for ParIndicesIterator<'_> {
    type Item = ArrayIndices;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        bridge(self, consumer)
    }

    fn opt_len(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl IndexedParallelIterator for ParIndicesIterator<'_> {
    fn with_producer<CB: ProducerCallback<Self::Item>>(self, callback: CB) -> CB::Output {
        callback.callback(ParIndicesIteratorProducer {
            space: self.space,
            index_front: self.index_front,
            index_back: self.index_back,
        })
    }

    fn drive<C: Consumer<Self::Item>>(self, consumer: C) -> C::Result {
        bridge(self, consumer)
    }

    fn len(&self) -> usize {
        usize::try_from(self.index_back - self.index_front).unwrap_or(usize::MAX)
    }
}

#[derive(Debug)]
struct ParIndicesIteratorProducer<'a> {
    space: &'a IndexSpace,
    index_front: u64,
    index_back: u64,
}

impl<'a> Producer for ParIndicesIteratorProducer<'a> {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new_with_start_end(self.space, self.index_front, self.index_back)
    }

    fn split_at(self, index: usize) -> (Self, Self) {
        let middle = self.index_front + index as u64;
        let left = ParIndicesIteratorProducer {
            space: self.space,
            index_front: self.index_front,
            index_back: middle,
        };
        let right = ParIndicesIteratorProducer {
            space: self.space,
            index_front: middle,
            index_back: self.index_back,
        };
        (left, right)
    }
}
