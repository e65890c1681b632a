//! Memory infrastructure for the Sable runtime.
//!
//! - [`Arena`]: bump allocator for scratch buffers whose lifetime is a whole
//!   VM run or an inner scope
//! - [`Pool`]: handle-indexed storage for heap objects, released in bulk at
//!   scope boundaries
//! - [`SymbolTable`]: method-name interning with stable, pre-reserved ids
//! - [`ArenaFactory`]: cheap creation of per-scope arenas

pub mod arena;
pub mod factory;
pub mod interner;
pub mod pool;
pub mod symbol;

pub use arena::{Arena, ArenaStats};
pub use factory::ArenaFactory;
pub use interner::SymbolTable;
pub use pool::{Handle, Pool, PoolMark};
pub use symbol::Symbol;
