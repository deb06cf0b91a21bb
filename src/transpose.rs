//! 2-D byte-level transpose.
//!
//! Some storage (such as HDF4 data written in column-major order) holds a 2-D array transposed relative to its logical shape.
//! [`transpose_2d`] flips such a buffer between row-major and column-major order, for elements of any width.

use thiserror::Error;

use crate::ArrayShape;

/// A transpose error.
#[derive(Debug, Error)]
pub enum TransposeError {
    /// The shape is not 2-D.
    #[error("transpose requires a 2-D shape, got {0:?}")]
    InvalidShape(ArrayShape),
    /// The bytes do not match the shape and element size.
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
}

/// Transpose `bytes`, a row-major array with a 2-D `shape` and elements of `elem_size` bytes.
///
/// Element `(row, col)` moves to element `col * shape[0] + row`.
/// The output has shape [`flipped_shape(shape)`](flipped_shape).
///
/// # Errors
/// Returns a [`TransposeError`] if `shape` is not 2-D or the length of `bytes` does not match `shape` and `elem_size`.
pub fn transpose_2d(bytes: &[u8], shape: &[u64], elem_size: usize) -> Result<Vec<u8>, TransposeError> {
    let [rows, cols] = shape else {
        return Err(TransposeError::InvalidShape(shape.to_vec()));
    };
    let to_usize = |size: u64| {
        usize::try_from(size).map_err(|_| TransposeError::InvalidShape(shape.to_vec()))
    };
    let array = ndarray::ArrayView3::<u8>::from_shape(
        (to_usize(*rows)?, to_usize(*cols)?, elem_size),
        bytes,
    )?;
    Ok(array.permuted_axes([1, 0, 2]).iter().copied().collect())
}

/// Return `shape` with its dimensions reversed.
#[must_use]
pub fn flipped_shape(shape: &[u64]) -> ArrayShape {
    shape.iter().rev().copied().collect()
}
