// Shared fixtures for the integration tests.
//
// The core has no numeric methods, so every test that enumerates integers
// installs `succ`, `<` and `<=` on `Int` the way an embedding host would.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use sable::{Arity, ClassId, Error, Result, Value, Vm, enumerable};

/// A VM with integer `succ`, `<` and `<=` installed.
pub fn vm() -> Vm {
    let mut vm = Vm::new();
    install_int_protocol(&mut vm);
    vm
}

pub fn install_int_protocol(vm: &mut Vm) {
    let int = vm.core().int;
    vm.define_method(int, "succ", Arity::Fixed(0), |_, this, _| {
        Ok(Value::Int(this.as_int().unwrap_or(0) + 1))
    });
    vm.define_method(int, "<", Arity::Fixed(1), |_, this, args| {
        Ok(Value::Bool(this.as_int() < args[0].as_int()))
    });
    vm.define_method(int, "<=", Arity::Fixed(1), |_, this, args| {
        Ok(Value::Bool(this.as_int() <= args[0].as_int()))
    });
}

/// Defines `Step`, a user class that satisfies the enumeration protocol
/// without being an `Int`: `succ` advances by `stride`, and `<`/`<=`
/// compare the wrapped numbers.
pub fn define_step_class(vm: &mut Vm, stride: i64) -> ClassId {
    let object = vm.core().object;
    let step = vm.define_class("Step", object).unwrap();

    vm.define_host_method(step, "succ", Arity::Fixed(0), move |vm, this, _| {
        let n = step_value(vm, this)?;
        make_step(vm, n + stride)
    });
    vm.define_method(step, "<", Arity::Fixed(1), |vm, this, args| {
        Ok(Value::Bool(step_value(vm, this)? < step_value(vm, args[0])?))
    });
    vm.define_method(step, "<=", Arity::Fixed(1), |vm, this, args| {
        Ok(Value::Bool(step_value(vm, this)? <= step_value(vm, args[0])?))
    });
    step
}

pub fn make_step(vm: &mut Vm, n: i64) -> Result<Value> {
    let Some(step) = vm.class_by_name("Step") else {
        panic!("define_step_class must run first");
    };
    let value = vm.instantiate(step);
    vm.ivar_set(value, "@n", Value::Int(n))?;
    Ok(value)
}

pub fn step_value(vm: &Vm, value: Value) -> Result<i64> {
    Ok(vm.ivar_get(value, "@n")?.as_int().unwrap_or(0))
}

/// Enumerates `range` to completion.
pub fn drain(vm: &mut Vm, range: Value) -> Result<Vec<Value>> {
    enumerable::collect(vm, range)
}

pub fn ints(values: &[Value]) -> Vec<i64> {
    values.iter().filter_map(|v| v.as_int()).collect()
}

/// Class and message of a raised exception.
pub fn raised(err: &Error) -> (ClassId, String) {
    match err.exception() {
        Some(exc) => (exc.class(), exc.message().to_string()),
        None => panic!("expected a raised exception, got {err}"),
    }
}

/// Installs `name` on `class` as a method returning `nil` and counting its
/// invocations.
pub fn counting_method(vm: &mut Vm, class: ClassId, name: &str, arity: Arity) -> Rc<Cell<usize>> {
    let count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&count);
    vm.define_host_method(class, name, arity, move |_, _, _| {
        counter.set(counter.get() + 1);
        Ok(Value::Nil)
    });
    count
}
