//! The uniform value handle.
//!
//! A [`Value`] is either an immediate (`nil`, a boolean, a small integer) or a
//! reference to an object in the VM's pool. It is `Copy` and compares by
//! content for immediates and by identity for references.
//!
//! ```
//! use sable::Value;
//!
//! let a = Value::from(3);
//! assert_eq!(a, Value::Int(3));
//! assert!(Value::Nil.is_nil());
//! assert!(!Value::FALSE.is_truthy());
//! assert!(Value::Int(0).is_truthy());
//! ```

use std::fmt;

use sable_mem::Handle;

/// Reference to a heap object.
///
/// Only meaningful to the VM that produced it, and only until the scope that
/// allocated the object ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(Handle);

impl ObjectRef {
    pub(crate) const fn new(handle: Handle) -> Self {
        ObjectRef(handle)
    }

    pub(crate) const fn handle(self) -> Handle {
        self.0
    }

    /// Pool slot of the object, for diagnostics.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0.index()
    }
}

/// Immediate scalar or object reference.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Ref(ObjectRef),
}

impl Value {
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);

    #[must_use]
    pub const fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` and `false` is truthy.
    #[must_use]
    pub const fn is_truthy(self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[must_use]
    pub const fn is_immediate(self) -> bool {
        !matches!(self, Value::Ref(_))
    }

    #[must_use]
    pub const fn as_int(self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(self) -> Option<ObjectRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(r: ObjectRef) -> Self {
        Value::Ref(r)
    }
}

impl fmt::Display for Value {
    /// Immediates print as literals; references print their slot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Ref(r) => write!(f, "#<object {}>", r.index()),
        }
    }
}
