//! Index space iterators.
//!
//! [`Indices`] iterates over the multidimensional indices of the elements in an [`IndexSpace`](super::IndexSpace), created with [`IndexSpace::indices`](super::IndexSpace::indices).
//! It supports [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]) and [`rayon`]'s [`into_par_iter()`](rayon::iter::IntoParallelIterator::into_par_iter) ([`IntoParallelIterator`](rayon::iter::IntoParallelIterator)).

mod indices_iterator;

pub use indices_iterator::{Indices, IndicesIterator, ParIndicesIterator};
