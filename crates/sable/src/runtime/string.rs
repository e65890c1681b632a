//! The `String` value type.
//!
//! Strings are immutable UTF-8 text held in a [`Payload::Str`]. The core only
//! stores, compares, measures and hashes them.

use crate::error::Result;
use crate::runtime::method::Arity;
use crate::runtime::object::Payload;
use crate::runtime::value::Value;
use crate::runtime::vm::Vm;

pub(crate) fn allocate_string(_vm: &mut Vm) -> Payload {
    Payload::Str(String::new())
}

/// Makes a string from raw bytes, replacing invalid UTF-8 with U+FFFD.
pub fn make_string(vm: &mut Vm, bytes: &[u8]) -> Value {
    make_cstring(vm, &String::from_utf8_lossy(bytes))
}

/// Makes a string from text.
pub fn make_cstring(vm: &mut Vm, text: &str) -> Value {
    let class = vm.core().string;
    let value = vm.instantiate(class);
    if let Some(object) = value.as_object().and_then(|r| vm.object_mut(r).ok()) {
        *object.payload_mut() = Payload::Str(text.to_string());
    }
    value
}

/// Copies the text out of a string.
///
/// # Errors
///
/// `TypeError` if `value` is not a `String`.
pub fn string_str(vm: &mut Vm, value: Value) -> Result<String> {
    if let Some(Payload::Str(text)) = vm.payload(value) {
        return Ok(text.clone());
    }
    let string = vm.core().string;
    vm.expect(value, string)?;
    Ok(String::new())
}

/// Length in characters, as an `Int`.
///
/// # Errors
///
/// `TypeError` if `value` is not a `String`.
pub fn string_length(vm: &mut Vm, value: Value) -> Result<Value> {
    let text = string_str(vm, value)?;
    Ok(Value::Int(text.chars().count() as i64))
}

pub(crate) fn init(vm: &mut Vm) {
    let string = vm.core().string;
    vm.define_method(string, "init", Arity::from_encoded(-1), string_init);
    vm.define_method(string, "length", Arity::Fixed(0), |vm, this, _| {
        string_length(vm, this)
    });
    vm.define_method(string, "==", Arity::Fixed(1), string_eq);
    vm.define_method(string, "hash", Arity::Fixed(0), string_hash);
}

fn string_init(vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    if args.len() > 1 {
        return Err(vm.arity_error(args.len(), "0..1"));
    }
    let text = match args.first() {
        Some(&arg) => string_str(vm, arg)?,
        None => String::new(),
    };
    let string = vm.core().string;
    vm.expect(this, string)?;
    if let Some(object) = this.as_object().and_then(|r| vm.object_mut(r).ok()) {
        *object.payload_mut() = Payload::Str(text);
    }
    Ok(this)
}

fn string_eq(vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    let equal = match (vm.payload(this), vm.payload(args[0])) {
        (Some(Payload::Str(a)), Some(Payload::Str(b))) => a == b,
        _ => false,
    };
    Ok(Value::Bool(equal))
}

fn string_hash(vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    let text = string_str(vm, this)?;
    Ok(Value::Int(fxhash::hash64(text.as_bytes()) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_read() {
        let mut vm = Vm::new();
        let s = make_cstring(&mut vm, "sable");

        assert_eq!(string_str(&mut vm, s).unwrap(), "sable");
        assert_eq!(string_length(&mut vm, s), Ok(Value::Int(5)));
        assert!(vm.is_a(s, vm.core().string));
    }

    #[test]
    fn test_lossy_bytes_and_char_length() {
        let mut vm = Vm::new();
        let s = make_string(&mut vm, b"ok\xff");
        assert_eq!(string_str(&mut vm, s).unwrap(), "ok\u{fffd}");

        let wide = make_cstring(&mut vm, "größe");
        assert_eq!(vm.send(wide, "length", &[]), Ok(Value::Int(5)));
    }

    #[test]
    fn test_content_equality_and_hash() {
        let mut vm = Vm::new();
        let a = make_cstring(&mut vm, "same");
        let b = make_cstring(&mut vm, "same");
        let c = make_cstring(&mut vm, "other");

        assert_ne!(a, b);
        assert_eq!(vm.send(a, "==", &[b]), Ok(Value::TRUE));
        assert_eq!(vm.send(a, "==", &[c]), Ok(Value::FALSE));
        assert_eq!(vm.send(a, "==", &[Value::Int(1)]), Ok(Value::FALSE));
        assert_eq!(vm.send(a, "hash", &[]), vm.send(b, "hash", &[]));
    }

    #[test]
    fn test_new_instance_copies_text() {
        let mut vm = Vm::new();
        let string = vm.core().string;
        let source = make_cstring(&mut vm, "copy me");
        let copy = vm.new_instance(string, &[source]).unwrap();
        let empty = vm.new_instance(string, &[]).unwrap();

        assert_eq!(string_str(&mut vm, copy).unwrap(), "copy me");
        assert_eq!(string_str(&mut vm, empty).unwrap(), "");
    }

    #[test]
    fn test_non_string_is_type_error() {
        let mut vm = Vm::new();
        let err = string_length(&mut vm, Value::Int(3)).unwrap_err();
        assert_eq!(
            err.exception().unwrap().message(),
            "Expected String, got Int"
        );
    }
}
