//! Layouts of array storage.
//!
//! A [`Layout`] iterates over the [`LayoutChunk`]s of a wanted index space in a storage layout, giving the byte position of each contiguous run in the storage.
//!
//! The layouts are:
//!  - [`LayoutRegular`]: an array stored contiguously in row-major order, such as a netCDF-3 non-record variable.
//!  - [`LayoutRegularSegmented`]: an array stored in regularly spaced records, such as a netCDF-3 record variable.
//!
//! [`MaxChunker`] splits a wanted index space into blocks of bounded size for streaming reads over storage that is not chunked.

mod max_chunker;
mod regular;
mod regular_segmented;

pub use max_chunker::{max_chunk_shape, MaxChunker};
pub use regular::LayoutRegular;
pub use regular_segmented::LayoutRegularSegmented;

use derive_more::Display;
use thiserror::Error;

use crate::{chunker::TransferChunk, index_space::IncompatibleDimensionalityError};

/// A storage layout.
///
/// Iterates over the [`LayoutChunk`]s of a wanted index space.
pub trait Layout: Iterator<Item = LayoutChunk> {
    /// The total number of elements to transfer.
    fn total_nelems(&self) -> u64;

    /// The size of an element in bytes.
    fn elem_size(&self) -> usize;
}

/// A run of elements that is contiguous in both the storage and the destination.
///
/// Read `nelems` elements from the storage at byte position `src_pos` (element `src_elem`) and copy them to the destination at element `dest_elem`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display)]
#[display("{nelems} elements from byte {src_pos} to {dest_elem}")]
pub struct LayoutChunk {
    /// The byte position in the storage.
    pub src_pos: u64,
    /// The first element in the storage.
    pub src_elem: u64,
    /// The number of elements.
    pub nelems: u64,
    /// The first element in the destination.
    pub dest_elem: u64,
}

impl LayoutChunk {
    /// Create a new layout chunk at byte position `src_pos` from a transfer chunk.
    #[must_use]
    pub const fn new(src_pos: u64, chunk: TransferChunk) -> Self {
        Self {
            src_pos,
            src_elem: chunk.src_elem,
            nelems: chunk.nelems,
            dest_elem: chunk.dest_elem,
        }
    }

    /// Return the transfer chunk of the layout chunk.
    #[must_use]
    pub const fn transfer_chunk(&self) -> TransferChunk {
        TransferChunk::new(self.src_elem, self.nelems, self.dest_elem)
    }
}

/// A layout creation error.
#[derive(Copy, Clone, Debug, Error)]
pub enum LayoutCreateError {
    /// The element size is zero.
    #[error("element size must be greater than zero")]
    ZeroElementSize,
    /// The record size is zero.
    #[error("record size must be greater than zero")]
    ZeroRecordSize,
    /// The maximum number of elements is zero.
    #[error("maximum elements must be greater than zero")]
    ZeroMaxElements,
    /// A segmented layout has a rank 0 shape.
    #[error("segmented layout requires at least one dimension")]
    ScalarSegmented,
    /// The dimensionality of the wanted index space does not match the storage.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
}
