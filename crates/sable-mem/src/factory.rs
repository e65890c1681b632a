//! Per-scope arena creation.
//!
//! An [`ArenaFactory`] remembers a chunk size and makes fresh [`Arena`]s on
//! demand. There is no pooling: each VM scope takes a new arena and drops it on
//! exit, which frees every scratch buffer the scope produced.
//!
//! ```
//! use sable_mem::ArenaFactory;
//!
//! let factory = ArenaFactory::new(64 * 1024);
//! let scratch = factory.create_arena();
//! assert_eq!(scratch.alloc_str("tmp"), "tmp");
//! ```

use crate::arena::Arena;

/// Creates arenas with a fixed chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaFactory {
    chunk_size: usize,
}

impl ArenaFactory {
    /// Creates a factory. The size is normalised by [`Arena::new`].
    #[must_use]
    pub const fn new(chunk_size: usize) -> Self {
        ArenaFactory { chunk_size }
    }

    /// Configured chunk size, before normalisation.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Makes a fresh, empty arena.
    #[must_use]
    pub fn create_arena(&self) -> Arena {
        Arena::new(self.chunk_size)
    }
}

impl Default for ArenaFactory {
    fn default() -> Self {
        Self::new(crate::arena::MIN_CHUNK_SIZE)
    }
}
