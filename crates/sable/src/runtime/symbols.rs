//! Well-known selectors.
//!
//! Every VM interns [`RESERVED`] first, so these constants are valid
//! symbols in any VM and the runtime can send them without interning.

use sable_mem::Symbol;

/// Names interned at VM creation, in id order.
pub const RESERVED: &[&str] = &[
    "init",
    "succ",
    "<",
    "<=",
    "==",
    "enumerate",
    "next",
    "current",
    "message",
    "lower",
    "upper",
    "length",
    "hash",
    "responds_to?",
];

pub const INIT: Symbol = Symbol::new(0);
pub const SUCC: Symbol = Symbol::new(1);
pub const OP_LT: Symbol = Symbol::new(2);
pub const OP_LTE: Symbol = Symbol::new(3);
pub const OP_EQ: Symbol = Symbol::new(4);
pub const ENUMERATE: Symbol = Symbol::new(5);
pub const NEXT: Symbol = Symbol::new(6);
pub const CURRENT: Symbol = Symbol::new(7);
pub const MESSAGE: Symbol = Symbol::new(8);
pub const LOWER: Symbol = Symbol::new(9);
pub const UPPER: Symbol = Symbol::new(10);
pub const LENGTH: Symbol = Symbol::new(11);
pub const HASH: Symbol = Symbol::new(12);
pub const RESPONDS_TO: Symbol = Symbol::new(13);
