use std::iter::FusedIterator;

use crate::{config::global_config, index_space::IndexSpace, odometer::Odometer, ArrayShape};

use super::LayoutCreateError;

/// Return the shape of the block starting at `cursor` (relative to the start of a space with `shape`).
///
/// The innermost dimension is always full.
/// Outer dimensions are full while they fit in `max_elems` and the cursor is at their start, the next dimension takes as many steps as fit (at least one) and the remaining dimensions take one step.
fn block_shape(shape: &[u64], cursor: &[i64], max_elems: u64) -> ArrayShape {
    let rank = shape.len();
    let mut block = vec![1; rank];
    let Some(innermost) = rank.checked_sub(1) else {
        return block;
    };
    block[innermost] = shape[innermost];
    let mut inner = shape[innermost];
    for k in (0..innermost).rev() {
        let fits = shape[k]
            .checked_mul(inner)
            .is_some_and(|size| size <= max_elems);
        if cursor[k] == 0 && fits {
            block[k] = shape[k];
            inner *= shape[k];
        } else {
            let steps = std::cmp::max(1, max_elems / inner);
            block[k] = std::cmp::min(steps, shape[k] - cursor[k] as u64);
            break;
        }
    }
    block
}

/// Return the shape of the first block of [`MaxChunker`] over an index space with `shape`.
#[must_use]
pub fn max_chunk_shape(shape: &[u64], max_elems: u64) -> ArrayShape {
    block_shape(shape, &vec![0; shape.len()], max_elems)
}

/// Splits a wanted index space into blocks of at most about `max_elems` elements.
///
/// The blocks partition the wanted index space in row-major order.
/// The innermost dimension is never split, so a block exceeds `max_elems` if a single row does.
///
/// For example, a `[20, 30, 40]` index space with a budget of `10_000` elements is split into blocks with shapes `[8, 30, 40]`, `[8, 30, 40]` and `[4, 30, 40]`.
#[derive(Clone, Debug)]
pub struct MaxChunker {
    want_space: IndexSpace,
    max_elems: u64,
    cursor: Odometer,
    total_nelems: u64,
    done: u64,
}

impl MaxChunker {
    /// Create a new max chunker over `want_space`.
    ///
    /// # Errors
    /// Returns [`LayoutCreateError::ZeroMaxElements`] if `max_elems` is zero.
    pub fn new(max_elems: u64, want_space: IndexSpace) -> Result<Self, LayoutCreateError> {
        if max_elems == 0 {
            return Err(LayoutCreateError::ZeroMaxElements);
        }
        let shape = want_space.shape().to_vec();
        let cursor = Odometer::new_unchecked(IndexSpace::new_with_shape(shape.clone()), &shape);
        tracing::trace!(
            "max chunker over {} with {} elements per block, first block {:?}",
            want_space,
            max_elems,
            max_chunk_shape(&shape, max_elems)
        );
        Ok(Self {
            total_nelems: want_space.num_elements(),
            want_space,
            max_elems,
            cursor,
            done: 0,
        })
    }

    /// Create a new max chunker over `want_space` with the [max chunk elements](crate::config::Config#max-chunk-elements) of the global configuration.
    ///
    /// # Errors
    /// Returns [`LayoutCreateError::ZeroMaxElements`] if the configured max chunk elements is zero.
    pub fn new_default(want_space: IndexSpace) -> Result<Self, LayoutCreateError> {
        let max_elems = global_config().max_chunk_elements();
        Self::new(max_elems, want_space)
    }

    /// Return the maximum number of elements in a block.
    #[must_use]
    pub fn max_elems(&self) -> u64 {
        self.max_elems
    }

    /// Return the total number of elements in the wanted index space.
    #[must_use]
    pub fn total_nelems(&self) -> u64 {
        self.total_nelems
    }
}

impl Iterator for MaxChunker {
    type Item = IndexSpace;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done >= self.total_nelems {
            return None;
        }
        let cursor = self.cursor.current();
        let shape = block_shape(self.want_space.shape(), cursor, self.max_elems);
        let start = std::iter::zip(self.want_space.start(), cursor)
            .map(|(start, cursor)| start + cursor)
            .collect();
        let block = IndexSpace::new_with_start_shape(start, shape).ok()?;
        self.done += block.num_elements();
        self.cursor.set(self.done);
        Some(block)
    }
}

impl FusedIterator for MaxChunker {}
