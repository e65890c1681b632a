//! Host-side driver for the enumeration protocol.
//!
//! Anything that answers `enumerate` with an object answering `next` and
//! `current` can be walked, whether it is a builtin `Range` or a class the
//! host defined.

use crate::error::Result;
use crate::runtime::symbols;
use crate::runtime::value::Value;
use crate::runtime::vm::Vm;

/// Calls `f` with each element of `enumerable`.
///
/// # Errors
///
/// Anything raised by the protocol sends or returned by `f`.
///
/// # Example
///
/// ```
/// use sable::{Arity, Value, Vm, enumerable, range};
///
/// let mut vm = Vm::new();
/// let int = vm.core().int;
/// vm.define_method(int, "succ", Arity::Fixed(0), |_, n, _| Ok(Value::Int(n.as_int().unwrap() + 1)));
/// vm.define_method(int, "<=", Arity::Fixed(1), |_, n, a| Ok(Value::Bool(n.as_int() <= a[0].as_int())));
///
/// let r = range::make_range(&mut vm, Value::Int(1), Value::Int(3));
/// let mut sum = 0;
/// enumerable::each(&mut vm, r, |_, v| {
///     sum += v.as_int().unwrap();
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(sum, 6);
/// ```
pub fn each(
    vm: &mut Vm,
    enumerable: Value,
    mut f: impl FnMut(&mut Vm, Value) -> Result<()>,
) -> Result<()> {
    let enumerator = vm.send_id(enumerable, symbols::ENUMERATE, &[])?;
    while vm.send_id(enumerator, symbols::NEXT, &[])?.is_truthy() {
        let element = vm.send_id(enumerator, symbols::CURRENT, &[])?;
        f(vm, element)?;
    }
    Ok(())
}

/// Collects every element of `enumerable`.
///
/// # Errors
///
/// Anything raised by the protocol sends.
pub fn collect(vm: &mut Vm, enumerable: Value) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    each(vm, enumerable, |_, element| {
        out.push(element);
        Ok(())
    })?;
    Ok(out)
}
