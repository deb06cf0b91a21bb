use crate::{
    chunker::{Chunker, Merge},
    index_space::{IncompatibleDimensionalityError, IndexSpace},
};

use super::{Layout, LayoutChunk, LayoutCreateError};

/// An array stored contiguously in row-major order.
///
/// Trailing dimensions spanned by the wanted index space are merged, so reading a whole array gives a single chunk.
#[derive(Clone, Debug)]
pub struct LayoutRegular {
    chunker: Chunker,
    start_pos: u64,
}

impl LayoutRegular {
    /// Create a new regular layout of an array with shape `var_shape` starting at byte `start_pos`.
    ///
    /// # Errors
    /// Returns a [`LayoutCreateError`] if `elem_size` is zero or the dimensionality of `want_space` does not match `var_shape`.
    pub fn new(
        start_pos: u64,
        elem_size: usize,
        var_shape: &[u64],
        want_space: &IndexSpace,
    ) -> Result<Self, LayoutCreateError> {
        if elem_size == 0 {
            return Err(LayoutCreateError::ZeroElementSize);
        }
        if var_shape.len() != want_space.rank() {
            return Err(
                IncompatibleDimensionalityError::new(want_space.rank(), var_shape.len()).into(),
            );
        }
        let chunker = Chunker::new(
            &IndexSpace::new_with_shape(var_shape.to_vec()),
            elem_size,
            want_space,
            Merge::All,
        )?;
        tracing::trace!(
            "regular layout of {} in {:?}: {} chunks of {} elements",
            want_space,
            var_shape,
            chunker.len(),
            chunker.nelems()
        );
        Ok(Self { chunker, start_pos })
    }
}

impl Layout for LayoutRegular {
    fn total_nelems(&self) -> u64 {
        self.chunker.total_nelems()
    }

    fn elem_size(&self) -> usize {
        self.chunker.elem_size()
    }
}

impl Iterator for LayoutRegular {
    type Item = LayoutChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let elem_size = self.chunker.elem_size() as u64;
        self.chunker
            .next()
            .map(|chunk| LayoutChunk::new(self.start_pos + chunk.src_elem * elem_size, chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunker.size_hint()
    }
}

impl ExactSizeIterator for LayoutRegular {}

impl std::iter::FusedIterator for LayoutRegular {}
