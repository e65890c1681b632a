//! The Sable runtime core.
//!
//! - [`value`]: immediate-or-reference [`Value`] handle
//! - [`object`]: heap objects and payload shapes
//! - [`class`]: class table, ancestry linearization, method tables
//! - [`method`]: method bodies and arity contracts
//! - [`dispatch`]: `send` and `responds_to`
//! - [`exception`]: `raise`, `rescue` and the top-level boundary
//! - [`vm`]: the VM, its scopes and core classes
//! - [`range`] and [`enumerable`]: the generic enumeration protocol
//! - [`string`]: the `String` value type
//! - [`platform`]: filesystem, environment and seeding services

pub mod class;
pub mod dispatch;
pub mod enumerable;
pub mod exception;
pub mod method;
pub mod object;
pub mod platform;
pub mod range;
pub mod string;
pub mod symbols;
pub mod value;
pub mod vm;

pub use class::{Class, ClassId, ClassTable};
pub use method::{Arity, HostFn, Imp, Method, NativeFn};
pub use object::{Allocator, Object, Payload};
pub use range::{Comparator, EnumeratorData, EnumeratorState, RangeData};
pub use value::{ObjectRef, Value};
pub use vm::{CoreClasses, Vm};
