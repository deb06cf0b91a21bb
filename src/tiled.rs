//! Assembly of a wanted index space from chunked storage.
//!
//! [`TiledData`] reads a wanted index space of a chunked (tiled) array.
//! For every tile intersecting the wanted index space, a [`Chunker`] transfers the elements of the stored chunk to the destination.
//! Tiles without a stored chunk are stamped with the fill value.
//!
//! Stored chunks are provided by a [`ChunkSource`], which is where a format reader plugs in its chunk index (such as an HDF5 B-tree) and decompression.
//! A stored chunk always has the full chunk shape, even at the upper boundary of the array.

use std::{borrow::Cow, collections::HashMap, convert::Infallible};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;
use unsafe_cell_slice::UnsafeCellSlice;

use crate::{
    chunker::{Chunker, Merge, TransferError},
    config::global_config,
    fill_value::FillValue,
    index_space::{IncompatibleDimensionalityError, IncompatibleIndexSpaceAndShapeError, IndexSpace},
    tiling::Tiling,
    ArrayIndices,
};

/// A source of stored chunks.
pub trait ChunkSource: Sync {
    /// The error type of the source.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the bytes of the stored chunk of `tile` with array origin `origin`, or [`None`] if the chunk is not stored.
    ///
    /// The bytes must be the decoded row-major elements of the full chunk shape.
    ///
    /// # Errors
    /// Returns an error if the chunk cannot be retrieved.
    fn chunk(&self, tile: &[i64], origin: &[i64]) -> Result<Option<Cow<'_, [u8]>>, Self::Error>;
}

/// Stored chunks keyed by their array origin.
impl ChunkSource for HashMap<ArrayIndices, Vec<u8>> {
    type Error = Infallible;

    fn chunk(&self, _tile: &[i64], origin: &[i64]) -> Result<Option<Cow<'_, [u8]>>, Infallible> {
        Ok(self.get(origin).map(|bytes| Cow::Borrowed(bytes.as_slice())))
    }
}

/// A tile intersecting a wanted index space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataChunk {
    /// The tile coordinates.
    pub tile: ArrayIndices,
    /// The array indices of the tile origin.
    pub origin: ArrayIndices,
    /// The index space of the stored chunk, the tile origin with the full chunk shape.
    pub space: IndexSpace,
}

/// A tiled read error.
#[derive(Debug, Error)]
pub enum TiledReadError {
    /// The element size is zero.
    #[error("element size must be greater than zero")]
    ZeroElementSize,
    /// The fill value size does not match the element size.
    #[error("fill value has {0} bytes, expected {1}")]
    InvalidFillValueSize(usize, usize),
    /// The wanted index space does not match the dimensionality of the tiling.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The wanted index space is out of bounds of the array.
    #[error(transparent)]
    OutOfBounds(#[from] IncompatibleIndexSpaceAndShapeError),
    /// The destination does not match the size of the wanted index space.
    #[error("destination has {0} bytes, expected {1}")]
    InvalidDestinationSize(usize, u64),
    /// A stored chunk does not have the size of a full chunk.
    #[error("stored chunk at {0:?} has {1} bytes, expected {2}")]
    InvalidChunkSize(ArrayIndices, usize, u64),
    /// A transfer error.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// The chunk source failed.
    #[error("chunk source error: {0}")]
    Source(Box<dyn std::error::Error + Send + Sync>),
}

/// Chunked (tiled) array data.
#[derive(Clone, Debug)]
pub struct TiledData {
    tiling: Tiling,
    elem_size: usize,
    fill_value: FillValue,
}

impl TiledData {
    /// Create new tiled data with elements of `elem_size` bytes.
    ///
    /// # Errors
    /// Returns a [`TiledReadError`] if `elem_size` is zero or does not match the size of `fill_value`.
    pub fn new(
        tiling: Tiling,
        elem_size: usize,
        fill_value: FillValue,
    ) -> Result<Self, TiledReadError> {
        if elem_size == 0 {
            return Err(TiledReadError::ZeroElementSize);
        }
        if fill_value.size() != elem_size {
            return Err(TiledReadError::InvalidFillValueSize(
                fill_value.size(),
                elem_size,
            ));
        }
        Ok(Self {
            tiling,
            elem_size,
            fill_value,
        })
    }

    /// Return the tiling.
    #[must_use]
    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    /// Return the element size in bytes.
    #[must_use]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Return the fill value.
    #[must_use]
    pub fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the data chunks intersecting `want_space` in row-major tile order.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `want_space` does not match the tiling.
    pub fn data_chunks(
        &self,
        want_space: &IndexSpace,
    ) -> Result<Vec<DataChunk>, IncompatibleDimensionalityError> {
        let chunk_shape = self.tiling.chunk_shape().to_vec();
        let tiles = self.tiling.tiles(want_space)?;
        tiles
            .iter()
            .map(|(tile, origin)| {
                IndexSpace::new_with_start_shape(origin.clone(), chunk_shape.clone())
                    .map(|space| DataChunk {
                        tile,
                        origin,
                        space,
                    })
            })
            .collect()
    }

    /// Read `want_space` from the stored chunks of `source`.
    ///
    /// Returns the row-major bytes of the wanted index space.
    ///
    /// # Errors
    /// Returns a [`TiledReadError`] if `want_space` is incompatible with the array, a stored chunk has an invalid size, or `source` fails.
    pub fn read<S: ChunkSource>(
        &self,
        source: &S,
        want_space: &IndexSpace,
    ) -> Result<Vec<u8>, TiledReadError> {
        let size = self.size_bytes(want_space)?;
        let size = usize::try_from(size)
            .map_err(|_| TiledReadError::InvalidDestinationSize(usize::MAX, size))?;
        let mut bytes = vec![0; size];
        self.read_into(source, want_space, &mut bytes)?;
        Ok(bytes)
    }

    /// Read `want_space` from the stored chunks of `source` into `dst`.
    ///
    /// Tiles are read concurrently if at least the [tiled concurrent minimum](crate::config::Config#tiled-concurrent-minimum) of tiles intersect `want_space`.
    ///
    /// # Errors
    /// Returns a [`TiledReadError`] if `want_space` is incompatible with the array, `dst` does not match the size of `want_space`, a stored chunk has an invalid size, or `source` fails.
    pub fn read_into<S: ChunkSource>(
        &self,
        source: &S,
        want_space: &IndexSpace,
        dst: &mut [u8],
    ) -> Result<(), TiledReadError> {
        let size = self.size_bytes(want_space)?;
        if dst.len() as u64 != size {
            return Err(TiledReadError::InvalidDestinationSize(dst.len(), size));
        }
        let data_chunks = self.data_chunks(want_space)?;
        let concurrent_minimum = global_config().tiled_concurrent_minimum();
        tracing::debug!(
            "tiled read of {} from {} tiles of {:?}",
            want_space,
            data_chunks.len(),
            self.tiling.chunk_shape()
        );

        if concurrent_minimum > 0 && data_chunks.len() >= concurrent_minimum {
            let dst = UnsafeCellSlice::new(dst);
            data_chunks.par_iter().try_for_each(|data_chunk| {
                // tiles are disjoint, so each chunk writes disjoint destination elements
                let dst = unsafe { dst.as_mut_slice() };
                self.read_chunk(source, data_chunk, want_space, dst)
            })
        } else {
            data_chunks
                .iter()
                .try_for_each(|data_chunk| self.read_chunk(source, data_chunk, want_space, dst))
        }
    }

    fn size_bytes(&self, want_space: &IndexSpace) -> Result<u64, TiledReadError> {
        if want_space.rank() != self.tiling.rank() {
            return Err(IncompatibleDimensionalityError::new(
                want_space.rank(),
                self.tiling.rank(),
            )
            .into());
        }
        if !want_space.inbounds_shape(self.tiling.var_shape()) {
            return Err(IncompatibleIndexSpaceAndShapeError::new(
                want_space.clone(),
                self.tiling.var_shape().to_vec(),
            )
            .into());
        }
        Ok(want_space.num_elements() * self.elem_size as u64)
    }

    fn read_chunk<S: ChunkSource>(
        &self,
        source: &S,
        data_chunk: &DataChunk,
        want_space: &IndexSpace,
        dst: &mut [u8],
    ) -> Result<(), TiledReadError> {
        let chunker = Chunker::new(&data_chunk.space, self.elem_size, want_space, Merge::All)?;
        let stored = source
            .chunk(&data_chunk.tile, &data_chunk.origin)
            .map_err(|err| TiledReadError::Source(Box::new(err)))?;
        if let Some(bytes) = stored {
            let expected = data_chunk.space.num_elements() * self.elem_size as u64;
            if bytes.len() as u64 != expected {
                return Err(TiledReadError::InvalidChunkSize(
                    data_chunk.origin.clone(),
                    bytes.len(),
                    expected,
                ));
            }
            chunker.transfer(&bytes, dst)?;
        } else {
            tracing::trace!("missing chunk at {:?}, using fill value", data_chunk.origin);
            chunker.transfer_fill(self.fill_value.as_bytes(), dst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stored chunks of a `[5, 7]` u8 array with `[2, 3]` chunks, where element `(i, j)` is `10 * i + j`.
    fn stored_chunks(tiling: &Tiling, skip: &[ArrayIndices]) -> HashMap<ArrayIndices, Vec<u8>> {
        let mut chunks = HashMap::new();
        for (tile, origin) in &tiling
            .tiles(&IndexSpace::new_with_shape(tiling.var_shape().to_vec()))
            .unwrap()
        {
            if skip.contains(&tile) {
                continue;
            }
            let space =
                IndexSpace::new_with_start_shape(origin.clone(), tiling.chunk_shape().to_vec())
                    .unwrap();
            let bytes = space
                .indices()
                .iter()
                .map(|index| (10 * index[0] + index[1]) as u8)
                .collect();
            chunks.insert(origin, bytes);
        }
        chunks
    }

    fn expected(want_space: &IndexSpace, missing: impl Fn(&[i64]) -> bool) -> Vec<u8> {
        want_space
            .indices()
            .iter()
            .map(|index| {
                if missing(index.as_slice()) {
                    255
                } else {
                    (10 * index[0] + index[1]) as u8
                }
            })
            .collect()
    }

    #[test]
    fn tiled_data_chunks() {
        let tiling = Tiling::new(vec![5, 7], &[2, 3]).unwrap();
        let tiled = TiledData::new(tiling, 1, FillValue::from(255u8)).unwrap();
        let data_chunks = tiled
            .data_chunks(&IndexSpace::new_with_ranges(&[1..=2, 5..=6]))
            .unwrap();
        assert_eq!(data_chunks.len(), 4);
        assert_eq!(data_chunks[0].tile, vec![0, 1]);
        assert_eq!(data_chunks[3].origin, vec![2, 6]);
        assert_eq!(
            data_chunks[3].space,
            IndexSpace::new_with_ranges(&[2..=3, 6..=8])
        );
    }

    #[test]
    fn tiled_read() {
        let tiling = Tiling::new(vec![5, 7], &[2, 3]).unwrap();
        let chunks = stored_chunks(&tiling, &[]);
        let tiled = TiledData::new(tiling, 1, FillValue::from(255u8)).unwrap();
        for want_space in [
            IndexSpace::new_with_shape(vec![5, 7]),
            IndexSpace::new_with_ranges(&[1..=3, 2..=6]),
            IndexSpace::new_with_ranges(&[4..=4, 6..=6]),
            IndexSpace::new_with_ranges(&[0..=4, 3..=3]),
        ] {
            assert_eq!(
                tiled.read(&chunks, &want_space).unwrap(),
                expected(&want_space, |_| false)
            );
        }
    }

    #[test]
    fn tiled_read_missing() {
        let tiling = Tiling::new(vec![5, 7], &[2, 3]).unwrap();
        let chunks = stored_chunks(&tiling, &[vec![1, 1], vec![2, 2]]);
        let tiled = TiledData::new(tiling, 1, FillValue::from(255u8)).unwrap();
        let want_space = IndexSpace::new_with_ranges(&[1..=4, 1..=6]);
        let missing = |index: &[i64]| {
            ((2..=3).contains(&index[0]) && (3..=5).contains(&index[1]))
                || (index[0] == 4 && index[1] == 6)
        };
        assert_eq!(
            tiled.read(&chunks, &want_space).unwrap(),
            expected(&want_space, missing)
        );
    }

    #[test]
    fn tiled_read_single_element_tiles() {
        // every element is its own tile, so tiles write adjacent destination bytes concurrently
        let tiling = Tiling::new(vec![5, 7], &[1, 1]).unwrap();
        let chunks = stored_chunks(&tiling, &[vec![3, 3]]);
        let tiled = TiledData::new(tiling, 1, FillValue::from(255u8)).unwrap();
        let want_space = IndexSpace::new_with_ranges(&[1..=4, 0..=6]);
        assert_eq!(tiled.data_chunks(&want_space).unwrap().len(), 28);
        assert_eq!(
            tiled.read(&chunks, &want_space).unwrap(),
            expected(&want_space, |index| index == [3, 3])
        );
    }

    #[test]
    fn tiled_read_errors() {
        let tiling = Tiling::new(vec![5, 7], &[2, 3]).unwrap();
        let mut chunks = stored_chunks(&tiling, &[]);
        let tiled = TiledData::new(tiling.clone(), 1, FillValue::from(255u8)).unwrap();
        assert!(matches!(
            tiled.read(&chunks, &IndexSpace::new_with_ranges(&[0..=5, 0..=1])),
            Err(TiledReadError::OutOfBounds(_))
        ));
        assert!(matches!(
            tiled.read(&chunks, &IndexSpace::new_with_shape(vec![5])),
            Err(TiledReadError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            tiled.read_into(&chunks, &IndexSpace::new_with_shape(vec![2, 2]), &mut [0; 3]),
            Err(TiledReadError::InvalidDestinationSize(3, 4))
        ));
        chunks.insert(vec![0, 0], vec![0; 5]);
        assert!(matches!(
            tiled.read(&chunks, &IndexSpace::new_with_shape(vec![2, 2])),
            Err(TiledReadError::InvalidChunkSize(..))
        ));
        assert!(matches!(
            TiledData::new(tiling.clone(), 2, FillValue::from(255u8)),
            Err(TiledReadError::InvalidFillValueSize(1, 2))
        ));
        assert!(matches!(
            TiledData::new(tiling, 0, FillValue::default()),
            Err(TiledReadError::ZeroElementSize)
        ));
    }
}
