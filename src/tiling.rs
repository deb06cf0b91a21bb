//! Tiling of chunked array storage.
//!
//! Chunked (tiled) storage splits an array into fixed-shape blocks that need not evenly divide the array shape.
//! A [`Tiling`] maps between array indices and tile coordinates, the indices of a block in the grid of blocks.
//! Tiles at the upper boundary of the array may extend past the array shape.

use std::{cmp::Ordering, iter::FusedIterator};

use thiserror::Error;

use crate::{
    index_space::{
        iterators::{Indices, IndicesIterator},
        IncompatibleDimensionalityError, IndexSpace,
    },
    ArrayIndices, ArrayShape,
};

/// A tiling error.
#[derive(Clone, Debug, Error)]
pub enum TilingCreateError {
    /// The chunk shape has an element equal to zero.
    #[error("chunk shape {0:?} has a zero extent")]
    ZeroChunkShape(ArrayShape),
    /// The chunk shape has fewer dimensions than the array.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
}

/// A regular tiling of an array.
///
/// The chunk shape may have more dimensions than the array shape (such as the trailing element size dimension of HDF5 chunks), the extra trailing dimensions are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tiling {
    var_shape: ArrayShape,
    chunk_shape: ArrayShape,
    tile_shape: ArrayShape,
}

impl Tiling {
    /// Create a new tiling of an array with shape `var_shape` into chunks with shape `chunk_shape`.
    ///
    /// # Errors
    /// Returns [`TilingCreateError`] if `chunk_shape` has fewer dimensions than `var_shape` or a zero extent.
    pub fn new(var_shape: ArrayShape, chunk_shape: &[u64]) -> Result<Self, TilingCreateError> {
        let rank = var_shape.len();
        if chunk_shape.len() < rank {
            return Err(IncompatibleDimensionalityError::new(chunk_shape.len(), rank).into());
        }
        let chunk_shape = chunk_shape[..rank].to_vec();
        if chunk_shape.contains(&0) {
            return Err(TilingCreateError::ZeroChunkShape(chunk_shape));
        }
        let tile_shape = std::iter::zip(&var_shape, &chunk_shape)
            .map(|(var, chunk)| var.div_ceil(*chunk))
            .collect();
        Ok(Self {
            var_shape,
            chunk_shape,
            tile_shape,
        })
    }

    /// Return the dimensionality of the tiling.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.var_shape.len()
    }

    /// Return the array shape.
    #[must_use]
    pub fn var_shape(&self) -> &[u64] {
        &self.var_shape
    }

    /// Return the chunk shape, without any trailing dimensions.
    #[must_use]
    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    /// Return the shape of the grid of tiles.
    #[must_use]
    pub fn tile_shape(&self) -> &[u64] {
        &self.tile_shape
    }

    /// Return the coordinates of the tile containing `point`.
    ///
    /// Extra trailing dimensions of `point` are ignored.
    #[must_use]
    pub fn tile(&self, point: &[i64]) -> ArrayIndices {
        std::iter::zip(point, &self.chunk_shape)
            .map(|(&index, &chunk)| index.div_euclid(chunk as i64))
            .collect()
    }

    /// Return the array indices of the origin of `tile`.
    #[must_use]
    pub fn index(&self, tile: &[i64]) -> ArrayIndices {
        std::iter::zip(tile, &self.chunk_shape)
            .map(|(&tile, &chunk)| tile * chunk as i64)
            .collect()
    }

    /// Return the index space of tile coordinates intersecting `space`.
    ///
    /// The result is not clipped to the [tile shape](Self::tile_shape).
    /// An empty `space` gives an empty tile index space.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `space` does not match.
    pub fn section(&self, space: &IndexSpace) -> Result<IndexSpace, IncompatibleDimensionalityError> {
        if space.rank() != self.rank() {
            return Err(IncompatibleDimensionalityError::new(
                space.rank(),
                self.rank(),
            ));
        }
        let first = self.tile(space.start());
        if space.is_empty() {
            return IndexSpace::new_with_start_shape(first, vec![0; self.rank()]);
        }
        let last = self.tile(&space.last());
        let ranges: Vec<_> = std::iter::zip(first, last)
            .map(|(first, last)| first..=last)
            .collect();
        Ok(IndexSpace::new_with_ranges(&ranges))
    }

    /// Return the row-major order of the tile containing `point` in the grid of tiles.
    #[must_use]
    pub fn order(&self, point: &[i64]) -> u64 {
        std::iter::zip(self.tile(point), &self.tile_shape)
            .fold(0, |order, (tile, &size)| order * size + tile as u64)
    }

    /// Compare the tiles containing `point1` and `point2` in row-major order.
    #[must_use]
    pub fn compare(&self, point1: &[i64], point2: &[i64]) -> Ordering {
        self.tile(point1).cmp(&self.tile(point2))
    }

    /// Return the index space of the array covered by `tile`.
    ///
    /// The index space is clipped to the array shape, so a boundary tile may be smaller than the chunk shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `tile` does not match.
    pub fn tile_space(&self, tile: &[i64]) -> Result<IndexSpace, IncompatibleDimensionalityError> {
        if tile.len() != self.rank() {
            return Err(IncompatibleDimensionalityError::new(tile.len(), self.rank()));
        }
        IndexSpace::new_with_start_shape(self.index(tile), self.chunk_shape.clone())?
            .bound(&self.var_shape)
    }

    /// Return an iterator over the tiles intersecting `space`.
    ///
    /// Unlike [`section`](Self::section), the tiles are clipped to the grid of tiles.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `space` does not match.
    pub fn tiles(&self, space: &IndexSpace) -> Result<Tiles, IncompatibleDimensionalityError> {
        let section = self
            .section(space)?
            .intersect_unchecked(&IndexSpace::new_with_shape(self.tile_shape.clone()));
        Ok(Tiles {
            indices: section.indices(),
            chunk_shape: self.chunk_shape.clone(),
        })
    }
}

/// The tiles intersecting an index space.
///
/// Created with [`Tiling::tiles`].
/// Iterates over the last dimension fastest, yielding `(tile, origin)` pairs of the tile coordinates and the array indices of the tile origin.
pub struct Tiles {
    indices: Indices,
    chunk_shape: ArrayShape,
}

impl Tiles {
    /// Return the number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if there are no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> TilesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Tiles {
    type Item = (ArrayIndices, ArrayIndices);
    type IntoIter = TilesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        TilesIterator {
            inner: self.indices.iter(),
            chunk_shape: &self.chunk_shape,
        }
    }
}

/// Serial tiles iterator.
///
/// See [`Tiles`].
pub struct TilesIterator<'a> {
    inner: IndicesIterator<'a>,
    chunk_shape: &'a [u64],
}

impl TilesIterator<'_> {
    fn origin(&self, tile: &[i64]) -> ArrayIndices {
        std::iter::zip(tile, self.chunk_shape)
            .map(|(&tile, &chunk)| tile * chunk as i64)
            .collect()
    }
}

impl Iterator for TilesIterator<'_> {
    type Item = (ArrayIndices, ArrayIndices);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|tile| {
            let origin = self.origin(&tile);
            (tile, origin)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for TilesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|tile| {
            let origin = self.origin(&tile);
            (tile, origin)
        })
    }
}

impl ExactSizeIterator for TilesIterator<'_> {}

impl FusedIterator for TilesIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiling_tile_index() {
        let tiling = Tiling::new(vec![4, 6, 20], &[1, 3, 20]).unwrap();
        assert_eq!(tiling.tile_shape(), &[4, 2, 1]);
        assert_eq!(tiling.tile(&[2, 5, 20]), vec![2, 1, 1]);
        assert_eq!(tiling.index(&[2, 1, 1]), vec![2, 3, 20]);
    }

    #[test]
    fn tiling_section() {
        let tiling = Tiling::new(vec![4, 6, 200], &[1, 3, 20]).unwrap();
        assert_eq!(
            tiling
                .section(&IndexSpace::new_with_ranges(&[1..=2, 1..=2, 0..=12]))
                .unwrap(),
            IndexSpace::new_with_ranges(&[1..=2, 0..=0, 0..=0])
        );
        assert_eq!(
            tiling
                .section(&IndexSpace::new_with_ranges(&[1..=3, 2..=4, 150..=199]))
                .unwrap(),
            IndexSpace::new_with_ranges(&[1..=3, 0..=1, 7..=9])
        );
        assert!(tiling
            .section(&IndexSpace::new_with_ranges(&[1..=3, 2..=4]))
            .is_err());

        let tiling = Tiling::new(vec![4, 6, 200], &[1, 3, 11]).unwrap();
        assert_eq!(
            tiling
                .section(&IndexSpace::new_with_ranges(&[1..=1, 4..=5, 33..=55]))
                .unwrap(),
            IndexSpace::new_with_ranges(&[1..=1, 1..=1, 3..=5])
        );
    }

    #[test]
    fn tiling_section_uneven() {
        let tiling = Tiling::new(vec![60, 120], &[15, 30]).unwrap();
        assert_eq!(
            tiling
                .section(&IndexSpace::new_with_ranges(&[20..=39, 40..=79]))
                .unwrap(),
            IndexSpace::new_with_ranges(&[1..=2, 1..=2])
        );

        let tiling = Tiling::new(vec![8395, 781, 385], &[1, 30, 30, 4]).unwrap();
        assert_eq!(tiling.tile_shape(), &[8395, 27, 13]);
        assert_eq!(
            tiling
                .section(&IndexSpace::new_with_ranges(&[0..=9, 0..=780, 0..=384]))
                .unwrap(),
            IndexSpace::new_with_ranges(&[0..=9, 0..=26, 0..=12])
        );
    }

    #[test]
    fn tiling_section_empty() {
        let tiling = Tiling::new(vec![60, 120], &[15, 30]).unwrap();
        let section = tiling
            .section(&IndexSpace::new_with_ranges(&[20..=39, 40..=39]))
            .unwrap();
        assert!(section.is_empty());
        assert!(tiling
            .tiles(&IndexSpace::new_with_ranges(&[20..=39, 40..=39]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn tiling_invalid() {
        assert!(matches!(
            Tiling::new(vec![4, 6], &[1, 0]),
            Err(TilingCreateError::ZeroChunkShape(_))
        ));
        assert!(matches!(
            Tiling::new(vec![4, 6], &[1]),
            Err(TilingCreateError::IncompatibleDimensionality(_))
        ));
    }

    #[test]
    fn tiling_order() {
        let tiling = Tiling::new(vec![60, 120], &[15, 30]).unwrap();
        assert_eq!(tiling.order(&[0, 0]), 0);
        assert_eq!(tiling.order(&[14, 119]), 3);
        assert_eq!(tiling.order(&[15, 0]), 4);
        assert_eq!(tiling.order(&[59, 119]), 15);
        assert_eq!(tiling.compare(&[14, 119], &[15, 0]), Ordering::Less);
        assert_eq!(tiling.compare(&[15, 29], &[16, 1]), Ordering::Equal);
        assert_eq!(tiling.compare(&[16, 31], &[16, 1]), Ordering::Greater);
    }

    #[test]
    fn tiling_tile_space() {
        let tiling = Tiling::new(vec![10, 7], &[4, 4]).unwrap();
        assert_eq!(
            tiling.tile_space(&[0, 0]).unwrap(),
            IndexSpace::new_with_ranges(&[0..=3, 0..=3])
        );
        assert_eq!(
            tiling.tile_space(&[2, 1]).unwrap(),
            IndexSpace::new_with_ranges(&[8..=9, 4..=6])
        );
        assert!(tiling.tile_space(&[2]).is_err());
    }

    #[test]
    fn tiling_tiles() {
        let tiling = Tiling::new(vec![10, 7], &[4, 4]).unwrap();
        let tiles = tiling
            .tiles(&IndexSpace::new_with_ranges(&[3..=9, 5..=6]))
            .unwrap();
        assert_eq!(tiles.len(), 3);
        let tiles: Vec<_> = tiles.iter().collect();
        assert_eq!(
            tiles,
            vec![
                (vec![0, 1], vec![0, 4]),
                (vec![1, 1], vec![4, 4]),
                (vec![2, 1], vec![8, 4]),
            ]
        );

        // wanted space beyond the array is clipped to the tile grid
        let tiles = tiling
            .tiles(&IndexSpace::new_with_ranges(&[8..=20, 0..=3]))
            .unwrap();
        assert_eq!(tiles.iter().map(|(tile, _)| tile).collect::<Vec<_>>(), vec![vec![2, 0]]);
    }
}
