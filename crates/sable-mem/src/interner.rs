//! Method-name interning.
//!
//! A [`SymbolTable`] assigns each distinct name a [`Symbol`]. Names given to
//! [`SymbolTable::with_reserved`] are interned first and in order, so the
//! runtime's well-known selectors (`init`, `succ`, `next`, ...) always carry
//! the same ids and can be matched as constants.
//!
//! # Examples
//!
//! ```
//! use sable_mem::SymbolTable;
//!
//! let mut table = SymbolTable::with_reserved(&["init", "succ"]);
//!
//! let succ = table.intern("succ");
//! assert_eq!(succ.as_u32(), 1);
//! assert!(table.is_reserved(succ));
//!
//! let custom = table.intern("frobnicate");
//! assert_eq!(table.resolve(custom), Some("frobnicate"));
//! assert_eq!(table.get("frobnicate"), Some(custom));
//! ```

use crate::symbol::Symbol;

// hashbrown when the "symbols" feature is on, std otherwise
#[cfg(feature = "symbols")]
use hashbrown::HashMap;

#[cfg(not(feature = "symbols"))]
use std::collections::HashMap;

/// Bidirectional name table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// Symbol id to name.
    names: Vec<Box<str>>,
    /// Name to symbol id.
    ids: HashMap<Box<str>, Symbol>,
    /// Count of names interned by `with_reserved`.
    reserved: u32,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table whose first ids are `names`, in order.
    ///
    /// Duplicate entries in `names` share the id of their first occurrence.
    #[must_use]
    pub fn with_reserved(names: &[&str]) -> Self {
        let mut table = Self::new();
        for name in names {
            table.intern(name);
        }
        table.reserved = table.len() as u32;
        table
    }

    /// Returns the symbol for `name`, adding it if needed.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX - 1` names are interned.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&sym) = self.ids.get(name) {
            return sym;
        }

        let id = u32::try_from(self.names.len())
            .ok()
            .filter(|&id| id != u32::MAX)
            .expect("symbol table exhausted");
        let sym = Symbol::new(id);
        self.names.push(name.into());
        self.ids.insert(name.into(), sym);
        sym
    }

    /// Looks up `name` without interning it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.ids.get(name).copied()
    }

    /// Name of `sym`, or `None` if this table never issued it.
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> Option<&str> {
        self.names.get(sym.as_usize()).map(|name| &**name)
    }

    /// Whether `sym` was interned by [`SymbolTable::with_reserved`].
    #[must_use]
    pub fn is_reserved(&self, sym: Symbol) -> bool {
        sym.as_u32() < self.reserved
    }

    /// Number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
