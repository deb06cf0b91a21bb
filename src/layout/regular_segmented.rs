use crate::{
    chunker::{Chunker, Merge},
    index_space::{IncompatibleDimensionalityError, IndexSpace},
};

use super::{Layout, LayoutChunk, LayoutCreateError};

/// An array stored in regularly spaced records.
///
/// The first dimension is the record dimension.
/// Consecutive records are `rec_size` bytes apart, which may exceed the size of a record when the records of other arrays are interleaved.
/// The record dimension is never merged, so each chunk lies within a single record.
#[derive(Clone, Debug)]
pub struct LayoutRegularSegmented {
    chunker: Chunker,
    start_pos: u64,
    rec_size: u64,
    inner_nelems: u64,
}

impl LayoutRegularSegmented {
    /// Create a new segmented layout of an array with shape `src_shape`, with the first record at byte `start_pos`.
    ///
    /// # Errors
    /// Returns a [`LayoutCreateError`] if `elem_size` or `rec_size` is zero, `src_shape` is empty, or the dimensionality of `want_space` does not match `src_shape`.
    pub fn new(
        start_pos: u64,
        elem_size: usize,
        rec_size: u64,
        src_shape: &[u64],
        want_space: &IndexSpace,
    ) -> Result<Self, LayoutCreateError> {
        if elem_size == 0 {
            return Err(LayoutCreateError::ZeroElementSize);
        }
        if rec_size == 0 {
            return Err(LayoutCreateError::ZeroRecordSize);
        }
        if src_shape.is_empty() {
            return Err(LayoutCreateError::ScalarSegmented);
        }
        if src_shape.len() != want_space.rank() {
            return Err(
                IncompatibleDimensionalityError::new(want_space.rank(), src_shape.len()).into(),
            );
        }
        let chunker = Chunker::new(
            &IndexSpace::new_with_shape(src_shape.to_vec()),
            elem_size,
            want_space,
            Merge::NotFirst,
        )?;
        let inner_nelems = src_shape[1..].iter().product();
        tracing::trace!(
            "segmented layout of {} in {:?} with record size {}: {} chunks of {} elements",
            want_space,
            src_shape,
            rec_size,
            chunker.len(),
            chunker.nelems()
        );
        Ok(Self {
            chunker,
            start_pos,
            rec_size,
            inner_nelems,
        })
    }

    fn src_pos(&self, elem: u64) -> u64 {
        let segno = elem / self.inner_nelems;
        let offset = elem % self.inner_nelems;
        self.start_pos + segno * self.rec_size + offset * self.chunker.elem_size() as u64
    }
}

impl Layout for LayoutRegularSegmented {
    fn total_nelems(&self) -> u64 {
        self.chunker.total_nelems()
    }

    fn elem_size(&self) -> usize {
        self.chunker.elem_size()
    }
}

impl Iterator for LayoutRegularSegmented {
    type Item = LayoutChunk;

    fn next(&mut self) -> Option<Self::Item> {
        // an empty record has no chunks, so inner_nelems is non-zero here
        let chunk = self.chunker.next()?;
        Some(LayoutChunk::new(self.src_pos(chunk.src_elem), chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunker.size_hint()
    }
}

impl ExactSizeIterator for LayoutRegularSegmented {}

impl std::iter::FusedIterator for LayoutRegularSegmented {}
