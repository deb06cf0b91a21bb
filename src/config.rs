//! ndlayout global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the ndlayout crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Max Chunk Elements
/// > default: `100_000`
///
/// The element budget of each block produced by [`MaxChunker::new_default`](crate::layout::MaxChunker::new_default).
/// Streaming reads over non-chunked storage hold at most about this many elements in memory at once.
/// The innermost dimension is never split, so a block may exceed the budget if a single row does.
///
/// ## Tiled Concurrent Minimum
/// > default: `4`
///
/// [`TiledData::read`](crate::tiled::TiledData::read) transfers tiles concurrently if at least this many tiles intersect the wanted index space.
/// Concurrency is disabled if set to zero.
#[derive(Debug)]
pub struct Config {
    max_chunk_elements: u64,
    tiled_concurrent_minimum: usize,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Config {
            max_chunk_elements: 100_000,
            tiled_concurrent_minimum: 4,
        }
    }
}

impl Config {
    /// Get the [max chunk elements](#max-chunk-elements) configuration.
    #[must_use]
    pub fn max_chunk_elements(&self) -> u64 {
        self.max_chunk_elements
    }

    /// Set the [max chunk elements](#max-chunk-elements) configuration.
    pub fn set_max_chunk_elements(&mut self, max_chunk_elements: u64) {
        self.max_chunk_elements = max_chunk_elements;
    }

    /// Get the [tiled concurrent minimum](#tiled-concurrent-minimum) configuration.
    #[must_use]
    pub fn tiled_concurrent_minimum(&self) -> usize {
        self.tiled_concurrent_minimum
    }

    /// Set the [tiled concurrent minimum](#tiled-concurrent-minimum) configuration.
    pub fn set_tiled_concurrent_minimum(&mut self, concurrent_minimum: usize) {
        self.tiled_concurrent_minimum = concurrent_minimum;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global ndlayout configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global ndlayout configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
