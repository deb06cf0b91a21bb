//! Index space algebra and transfer chunk layouts for multidimensional scientific arrays.
//!
//! netCDF, HDF4 and HDF5 files store array data in one of three physical layouts:
//!  - fully contiguous row-major arrays,
//!  - record-segmented arrays, where the outermost dimension is strided at a fixed record pitch, and
//!  - chunked (tiled) arrays, split into fixed-shape blocks that need not evenly divide the array.
//!
//! Readers of these formats must map any of these layouts onto an arbitrary rectangular subset of the logical array.
//! This crate computes *where* the elements live: the minimal sequence of maximal contiguous runs that can be bulk copied.
//! It does no I/O and never interprets element bytes.
//!
//! ## Overview
//!  - [`IndexSpace`](index_space::IndexSpace): a rectangular region of an N-dimensional index space.
//!  - [`Odometer`](odometer::Odometer): converts between N-dimensional indices and linearised elements, and steps through an index space.
//!  - [`Tiling`](tiling::Tiling): maps between array indices and tile (chunk) coordinates.
//!  - [`Chunker`](chunker::Chunker): emits [`TransferChunk`](chunker::TransferChunk)s between a storage index space and a wanted index space.
//!  - [`layout`]: contiguous, record-segmented and bounded-size streaming layouts built on the chunker.
//!  - [`TiledData`](tiled::TiledData): assembles a wanted index space from stored chunks, stamping a fill value for missing chunks.
//!
//! ## Example
//! ```rust
//! # use ndlayout::{chunker::{Chunker, Merge, TransferChunk}, index_space::IndexSpace};
//! let data_chunk = IndexSpace::new_with_shape(vec![1, 6, 12]);
//! let want_space = IndexSpace::new_with_ranges(&[0..=0, 0..=5, 4..=7]);
//! let chunker = Chunker::new(&data_chunk, 4, &want_space, Merge::NotFirst)?;
//! let chunks: Vec<TransferChunk> = chunker.collect();
//! assert_eq!(chunks.len(), 6);
//! assert_eq!(chunks[1], TransferChunk::new(16, 4, 4));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `transpose`: the 2-D byte [`transpose`] utility, using [`ndarray`].
//!
//! ## Licence
//! `ndlayout` is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license or <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod chunker;
pub mod config;
pub mod fill_value;
pub mod index_space;
pub mod layout;
pub mod odometer;
pub mod section;
pub mod tiled;
pub mod tiling;
#[cfg(feature = "transpose")]
pub mod transpose;

/// The indices of an element in an array.
///
/// Indices are signed: an [`IndexSpace`](index_space::IndexSpace) shifted to another origin may start below zero.
pub type ArrayIndices = Vec<i64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// Return the number of elements of an array with `shape`.
///
/// A rank 0 (scalar) shape has one element.
#[must_use]
pub fn num_elements(shape: &[u64]) -> u64 {
    shape.iter().product()
}
