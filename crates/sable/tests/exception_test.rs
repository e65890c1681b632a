//! Exception tests: raising, rescuing, the top-level boundary and error
//! objects.
//!
//! Run with: `cargo test --test exception_test`

mod common;

use common::raised;
use sable::{Arity, Error, Exception, Value, Vm, string};

fn define_raiser(vm: &mut Vm) -> Value {
    let object = vm.core().object;
    vm.define_method(object, "raise_type", Arity::Fixed(0), |vm, _, _| {
        let type_error = vm.core().type_error;
        Err(vm.raise(type_error, "from method"))
    });
    vm.instantiate(object)
}

#[test]
fn test_raise_aborts_pending_sends() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);
    let object = vm.core().object;
    let after = common::counting_method(&mut vm, object, "after", Arity::Fixed(0));
    vm.define_method(object, "sequence", Arity::Fixed(0), |vm, this, _| {
        vm.send(this, "raise_type", &[])?;
        vm.send(this, "after", &[])
    });

    let err = vm.send(obj, "sequence", &[]).unwrap_err();
    assert_eq!(raised(&err).1, "from method");
    assert_eq!(after.get(), 0);
}

#[test]
fn test_rescue_inside_method() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);
    let object = vm.core().object;
    vm.define_method(object, "safe", Arity::Fixed(0), |vm, this, _| {
        let type_error = vm.core().type_error;
        vm.rescue(
            |vm| vm.send(this, "raise_type", &[]),
            &[type_error],
            |_, exc: Exception| Ok(Value::Int(exc.message().len() as i64)),
        )
    });

    assert_eq!(vm.send(obj, "safe", &[]), Ok(Value::Int(11)));
    assert_eq!(vm.call_depth(), 0);
}

#[test]
fn test_nested_rescue_innermost_matching_handler() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);
    let core = *vm.core();

    let result = vm.rescue(
        |vm| {
            vm.rescue(
                |vm| vm.send(obj, "raise_type", &[]),
                &[core.argument_error],
                |_, _| Ok(Value::Int(1)),
            )
        },
        &[core.error],
        |_, exc| {
            assert_eq!(exc.class(), core.type_error);
            Ok(Value::Int(2))
        },
    );
    assert_eq!(result, Ok(Value::Int(2)));
}

#[test]
fn test_handler_may_reraise() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);
    let core = *vm.core();

    let result = vm.rescue(
        |vm| vm.send(obj, "raise_type", &[]),
        &[core.type_error],
        |vm, exc| Err(vm.raise(core.argument_error, format!("wrapped: {}", exc.message()))),
    );
    assert_eq!(
        raised(&result.unwrap_err()),
        (core.argument_error, "wrapped: from method".to_string())
    );
}

#[test]
fn test_user_error_subclass() {
    let mut vm = Vm::new();
    let core = *vm.core();
    let parse_error = vm.define_class("ParseError", core.error).unwrap();

    let err = vm.raise(parse_error, "unexpected token");
    let exc = err.exception().unwrap();
    assert_eq!(exc.class_name(), "ParseError");
    assert!(vm.is_a(exc.value(), core.error));

    let caught = vm.rescue(
        |_| -> sable::Result<()> { Err(err.clone()) },
        &[core.error],
        |_, exc| {
            assert_eq!(exc.message(), "unexpected token");
            Ok(())
        },
    );
    assert!(caught.is_ok());
}

#[test]
fn test_error_object_message_via_send() {
    let mut vm = Vm::new();
    let argument_error = vm.core().argument_error;
    let err = vm.raise(argument_error, "bad arg");
    let value = err.exception().unwrap().value();

    let message = vm.send(value, "message", &[]).unwrap();
    assert_eq!(string::string_str(&mut vm, message).unwrap(), "bad arg");
}

#[test]
fn test_run_reports_and_returns_uncaught() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);

    let result = vm.run(|vm| vm.send(obj, "raise_type", &[]));
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "TypeError: from method");
    assert_eq!(err.exception().unwrap().backtrace(), ["Object#raise_type"]);

    assert_eq!(vm.run(|_| Ok(5)), Ok(5));
}

#[test]
fn test_exception_survives_scope() {
    let mut vm = Vm::new();
    let obj = define_raiser(&mut vm);

    let err = vm.scope(|vm| vm.send(obj, "raise_type", &[])).unwrap_err();
    let exc = err.exception().unwrap();

    assert_eq!(exc.message(), "from method");
    assert!(matches!(
        vm.send(exc.value(), "message", &[]),
        Err(Error::StaleReference { .. })
    ));
}
