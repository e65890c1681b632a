//! # Sable
//!
//! Runtime core of an embeddable, class-based dynamic language.
//!
//! A [`Vm`] owns a class table with single inheritance and mixin modules, a
//! dispatch engine that resolves sends by name at runtime, exceptions that
//! unwind through ordinary `Result` propagation, and a scoped object pool.
//! Library types are built on the same machinery the host uses: `Range` and
//! its enumerator drive any value that responds to `succ`, `<` and `<=`.
//!
//! ## Example
//!
//! ```
//! use sable::{Arity, Value, Vm, enumerable, range};
//!
//! let mut vm = Vm::new();
//! let int = vm.core().int;
//! vm.define_method(int, "succ", Arity::Fixed(0), |_, n, _| {
//!     Ok(Value::Int(n.as_int().unwrap_or(0) + 1))
//! });
//! vm.define_method(int, "<", Arity::Fixed(1), |_, n, args| {
//!     Ok(Value::Bool(n.as_int() < args[0].as_int()))
//! });
//!
//! let r = range::make_range_exclusive(&mut vm, Value::Int(0), Value::Int(3));
//! let items = enumerable::collect(&mut vm, r).unwrap();
//! assert_eq!(items, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
//! ```
//!
//! ## Logging
//!
//! The runtime logs through `sable-log`: class and method definitions and
//! raised exceptions at Debug, every send and scope change at Trace, and
//! uncaught exceptions at Error. Set the level with [`VmConfig::log_level`]
//! or the `SABLE_LOG` environment variable via [`VmConfig::from_env`].

pub mod config;
pub mod error;
pub mod runtime;

pub use config::VmConfig;
pub use error::{Error, Exception, Result};
pub use runtime::{
    Arity, Class, ClassId, ClassTable, Comparator, CoreClasses, EnumeratorData, EnumeratorState,
    HostFn, Imp, Method, NativeFn, Object, ObjectRef, Payload, RangeData, Value, Vm, enumerable,
    platform, range, string, symbols,
};
