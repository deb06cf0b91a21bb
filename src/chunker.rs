//! The transfer chunker.
//!
//! A [`Chunker`] finds the contiguous runs of elements to copy from a stored data chunk to the destination buffer of a wanted index space.
//! Each run is a [`TransferChunk`] in units of elements.
//!
//! The chunker intersects the data chunk with the wanted index space and steps two [`Odometer`]s over the intersection in lockstep, one in the frame of the data chunk and one in the frame of the wanted index space.
//! Trailing dimensions where the intersection spans both the data chunk and the wanted index space are merged into a single run, subject to the [`Merge`] policy.
//!
//! Emitted chunks are monotonically increasing in both the source and destination, so chunkers over disjoint data chunks write disjoint destination elements.

use std::iter::FusedIterator;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    index_space::{IncompatibleDimensionalityError, IndexSpace},
    odometer::Odometer,
};

/// The dimension merge policy of a [`Chunker`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Merge {
    /// Merge trailing dimensions down to the first dimension.
    #[default]
    All,
    /// Never merge the first two dimensions.
    ///
    /// Used for record-segmented storage, where the record dimension has a pitch that differs from its logical extent.
    NotFirst,
    /// Never merge dimensions.
    None,
}

/// A contiguous run of `nelems` elements to copy from `src_elem` in the source to `dest_elem` in the destination.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
#[display("{nelems} elements from {src_elem} to {dest_elem}")]
pub struct TransferChunk {
    /// The first element in the source.
    pub src_elem: u64,
    /// The number of elements.
    pub nelems: u64,
    /// The first element in the destination.
    pub dest_elem: u64,
}

impl TransferChunk {
    /// Create a new transfer chunk.
    #[must_use]
    pub const fn new(src_elem: u64, nelems: u64, dest_elem: u64) -> Self {
        Self {
            src_elem,
            nelems,
            dest_elem,
        }
    }
}

/// Iterates over the [`TransferChunk`]s from a data chunk to a wanted index space.
///
/// A chunker is consumed by iteration, construct a new one to iterate again.
#[derive(Clone, Debug)]
pub struct Chunker {
    src: Odometer,
    dst: Odometer,
    elem_size: usize,
    nelems: u64,
    incr_digit: usize,
    total_nelems: u64,
    done: u64,
    transfer_chunks: usize,
}

impl Chunker {
    /// Create a new chunker from `data_chunk` to `want_space`.
    ///
    /// `data_chunk` may have one more dimension than `want_space` (such as the trailing element size dimension of HDF5 chunks), which is ignored.
    /// `elem_size` is the size of an element in bytes, it is carried for callers and does not affect the chunks.
    ///
    /// If `data_chunk` and `want_space` do not intersect the chunker is empty.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `data_chunk` does not match `want_space`.
    pub fn new(
        data_chunk: &IndexSpace,
        elem_size: usize,
        want_space: &IndexSpace,
        merge: Merge,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        let rank = want_space.rank();
        let data_chunk = if data_chunk.rank() == rank {
            data_chunk.clone()
        } else if data_chunk.rank() == rank + 1 {
            IndexSpace::new_with_start_shape(
                data_chunk.start()[..rank].to_vec(),
                data_chunk.shape()[..rank].to_vec(),
            )?
        } else {
            return Err(IncompatibleDimensionalityError::new(
                data_chunk.rank(),
                rank,
            ));
        };

        let intersect = want_space.intersect_unchecked(&data_chunk);
        let total_nelems = intersect.num_elements();
        if total_nelems == 0 {
            let empty = IndexSpace::new_empty(rank);
            return Ok(Self {
                src: Odometer::new_unchecked(empty.clone(), data_chunk.shape()),
                dst: Odometer::new_unchecked(empty, want_space.shape()),
                elem_size,
                nelems: 0,
                incr_digit: 0,
                total_nelems: 0,
                done: 0,
                transfer_chunks: 0,
            });
        }

        let src = Odometer::new_unchecked(
            intersect.shift_unchecked(data_chunk.start()),
            data_chunk.shape(),
        );
        let dst = Odometer::new_unchecked(
            intersect.shift_unchecked(want_space.start()),
            want_space.shape(),
        );

        let merge_dims = merge_dims(&intersect, data_chunk.shape(), want_space.shape(), merge);
        let first_dim = if merge_dims == rank {
            0
        } else {
            rank - merge_dims - 1
        };
        let nelems = if rank == 1 && merge == Merge::NotFirst {
            1
        } else {
            intersect.shape()[first_dim..].iter().product()
        };

        Ok(Self {
            src,
            dst,
            elem_size,
            nelems,
            incr_digit: first_dim.saturating_sub(1),
            total_nelems,
            done: 0,
            transfer_chunks: 0,
        })
    }

    /// Return the number of elements in each transfer chunk.
    #[must_use]
    pub fn nelems(&self) -> u64 {
        self.nelems
    }

    /// Return the total number of elements to transfer, the number of elements in the intersection.
    #[must_use]
    pub fn total_nelems(&self) -> u64 {
        self.total_nelems
    }

    /// Return the element size in bytes.
    #[must_use]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Return the number of transfer chunks emitted so far.
    #[must_use]
    pub fn transfer_chunks(&self) -> usize {
        self.transfer_chunks
    }

    /// Copy the bytes of the remaining transfer chunks from `src` to `dst`.
    ///
    /// # Errors
    /// Returns a [`TransferError`] if a transfer chunk is out of bounds of `src` or `dst`.
    pub fn transfer(self, src: &[u8], dst: &mut [u8]) -> Result<(), TransferError> {
        let elem_size = self.elem_size;
        transfer(self, src, elem_size, dst)
    }

    /// Stamp `fill_value` over the destination elements of the remaining transfer chunks.
    ///
    /// # Errors
    /// Returns a [`TransferError`] if a transfer chunk is out of bounds of `dst` or `fill_value` does not match the element size.
    pub fn transfer_fill(self, fill_value: &[u8], dst: &mut [u8]) -> Result<(), TransferError> {
        if fill_value.len() != self.elem_size {
            return Err(TransferError::InvalidFillValueSize(
                fill_value.len(),
                self.elem_size,
            ));
        }
        transfer_fill(self, fill_value, dst)
    }
}

/// Count the trailing dimensions where the intersection spans both the source and destination.
fn merge_dims(intersect: &IndexSpace, src_shape: &[u64], dst_shape: &[u64], merge: Merge) -> usize {
    let merge_downto = match merge {
        Merge::All => 0,
        Merge::NotFirst => 2,
        Merge::None => return 0,
    };
    (merge_downto..intersect.rank())
        .rev()
        .take_while(|&dim| {
            let size = intersect.shape()[dim];
            size == src_shape[dim] && size == dst_shape[dim]
        })
        .count()
}

impl Iterator for Chunker {
    type Item = TransferChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done >= self.total_nelems {
            return None;
        }
        if self.transfer_chunks > 0 {
            self.src.incr_digit(self.incr_digit);
            self.dst.incr_digit(self.incr_digit);
        }
        self.done += self.nelems;
        self.transfer_chunks += 1;
        Some(TransferChunk::new(
            self.src.element(),
            self.nelems,
            self.dst.element(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.nelems == 0 {
            0
        } else {
            usize::try_from((self.total_nelems - self.done) / self.nelems).unwrap_or(usize::MAX)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunker {}

impl FusedIterator for Chunker {}

/// A transfer error.
#[derive(Copy, Clone, Debug, Error)]
pub enum TransferError {
    /// A transfer chunk is out of bounds of the source.
    #[error("transfer chunk ({0}) is out of bounds of a source with {1} bytes")]
    SourceOutOfBounds(TransferChunk, usize),
    /// A transfer chunk is out of bounds of the destination.
    #[error("transfer chunk ({0}) is out of bounds of a destination with {1} bytes")]
    DestinationOutOfBounds(TransferChunk, usize),
    /// The fill value size does not match the element size.
    #[error("fill value has {0} bytes, expected {1}")]
    InvalidFillValueSize(usize, usize),
}

/// Return the byte range of `nelems` elements from `elem` if it is within `len` bytes.
fn byte_range(elem: u64, nelems: u64, elem_size: usize, len: usize) -> Option<std::ops::Range<usize>> {
    let start = usize::try_from(elem).ok()?.checked_mul(elem_size)?;
    let size = usize::try_from(nelems).ok()?.checked_mul(elem_size)?;
    let end = start.checked_add(size)?;
    (end <= len).then_some(start..end)
}

/// Copy the bytes of `chunks` from `src` to `dst`.
///
/// # Errors
/// Returns a [`TransferError`] if a transfer chunk is out of bounds of `src` or `dst`.
pub fn transfer(
    chunks: impl IntoIterator<Item = TransferChunk>,
    src: &[u8],
    elem_size: usize,
    dst: &mut [u8],
) -> Result<(), TransferError> {
    for chunk in chunks {
        let src_range = byte_range(chunk.src_elem, chunk.nelems, elem_size, src.len())
            .ok_or(TransferError::SourceOutOfBounds(chunk, src.len()))?;
        let dst_range = byte_range(chunk.dest_elem, chunk.nelems, elem_size, dst.len())
            .ok_or(TransferError::DestinationOutOfBounds(chunk, dst.len()))?;
        dst[dst_range].copy_from_slice(&src[src_range]);
    }
    Ok(())
}

/// Stamp `fill_value` over the destination elements of `chunks`.
///
/// The element size is the length of `fill_value`.
///
/// # Errors
/// Returns a [`TransferError`] if a transfer chunk is out of bounds of `dst`.
pub fn transfer_fill(
    chunks: impl IntoIterator<Item = TransferChunk>,
    fill_value: &[u8],
    dst: &mut [u8],
) -> Result<(), TransferError> {
    let elem_size = fill_value.len();
    if elem_size == 0 {
        return Ok(());
    }
    for chunk in chunks {
        let dst_range = byte_range(chunk.dest_elem, chunk.nelems, elem_size, dst.len())
            .ok_or(TransferError::DestinationOutOfBounds(chunk, dst.len()))?;
        dst[dst_range]
            .chunks_exact_mut(elem_size)
            .for_each(|element| element.copy_from_slice(fill_value));
    }
    Ok(())
}
