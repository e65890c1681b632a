//! Method implementations and arity contracts.

use std::fmt;
use std::rc::Rc;

use sable_mem::Symbol;

use crate::error::Result;
use crate::runtime::class::ClassId;
use crate::runtime::value::Value;
use crate::runtime::vm::Vm;

/// Builtin method body: `(vm, receiver, args) -> result`.
pub type NativeFn = fn(&mut Vm, Value, &[Value]) -> Result<Value>;

/// Host-installed method body, e.g. an interpreted method compiled by an
/// embedding interpreter.
pub type HostFn = Rc<dyn Fn(&mut Vm, Value, &[Value]) -> Result<Value>>;

/// Method body.
#[derive(Clone)]
pub enum Imp {
    Native(NativeFn),
    Host(HostFn),
}

impl Imp {
    /// Runs the body. Arity is the caller's concern.
    ///
    /// # Errors
    ///
    /// Whatever the body returns.
    pub fn call(&self, vm: &mut Vm, receiver: Value, args: &[Value]) -> Result<Value> {
        match self {
            Imp::Native(f) => f(vm, receiver, args),
            Imp::Host(f) => f(vm, receiver, args),
        }
    }
}

impl fmt::Debug for Imp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imp::Native(func) => write!(f, "Native({:p})", *func as *const ()),
            Imp::Host(_) => f.write_str("Host(..)"),
        }
    }
}

/// Declared argument count.
///
/// ```
/// use sable::Arity;
///
/// assert_eq!(Arity::from_encoded(1), Arity::Fixed(1));
/// assert_eq!(Arity::from_encoded(-3), Arity::AtLeast(2));
/// assert!(Arity::AtLeast(2).accepts(3));
/// assert!(!Arity::Fixed(0).accepts(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly `n` arguments.
    Fixed(usize),
    /// `n` or more arguments.
    AtLeast(usize),
}

impl Arity {
    /// Decodes the signed convention: `n >= 0` is exactly `n`, `n < 0` is at
    /// least `-n - 1`.
    #[must_use]
    pub const fn from_encoded(encoded: i32) -> Self {
        if encoded >= 0 {
            Arity::Fixed(encoded as usize)
        } else {
            Arity::AtLeast((-(encoded as i64) - 1) as usize)
        }
    }

    /// Inverse of [`Arity::from_encoded`].
    #[must_use]
    pub const fn encoded(self) -> i64 {
        match self {
            Arity::Fixed(n) => n as i64,
            Arity::AtLeast(n) => -(n as i64) - 1,
        }
    }

    #[must_use]
    pub const fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Fixed(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "{n}+"),
        }
    }
}

/// An entry in a class's method table.
#[derive(Debug, Clone)]
pub struct Method {
    name: Symbol,
    arity: Arity,
    imp: Imp,
    owner: ClassId,
}

impl Method {
    pub(crate) fn new(name: Symbol, arity: Arity, imp: Imp, owner: ClassId) -> Self {
        Method {
            name,
            arity,
            imp,
            owner,
        }
    }

    #[must_use]
    pub fn name(&self) -> Symbol {
        self.name
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[must_use]
    pub fn imp(&self) -> &Imp {
        &self.imp
    }

    /// Class whose table holds this method.
    #[must_use]
    pub fn owner(&self) -> ClassId {
        self.owner
    }
}
