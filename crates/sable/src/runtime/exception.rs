//! Raising, rescuing and reporting exceptions.
//!
//! Exceptions unwind as `Err(Error::Raised(..))` through ordinary `?`
//! propagation. Every send pops its frame on the way out, so by the time an
//! error reaches [`Vm::rescue`] or [`Vm::run`] the VM is back at the call
//! depth of the handler.
//!
//! ```
//! use sable::{Value, Vm};
//!
//! let mut vm = Vm::new();
//! let core = *vm.core();
//!
//! let recovered = vm.rescue(
//!     |vm| vm.send(Value::Nil, "missing", &[]),
//!     &[core.no_method_error],
//!     |_, exc| {
//!         assert_eq!(exc.class_name(), "NoMethodError");
//!         Ok(Value::Int(0))
//!     },
//! );
//! assert_eq!(recovered, Ok(Value::Int(0)));
//! ```

use sable_log::{debug, error};

use crate::error::{Error, Exception, Result};
use crate::runtime::class::ClassId;
use crate::runtime::method::Arity;
use crate::runtime::object::Payload;
use crate::runtime::string::{make_cstring, string_str};
use crate::runtime::value::{ObjectRef, Value};
use crate::runtime::vm::Vm;

pub(crate) fn allocate_error(_vm: &mut Vm) -> Payload {
    Payload::Error {
        message: String::new(),
    }
}

impl Vm {
    /// Builds an instance of `class` carrying `message` and returns the
    /// error that unwinds with it.
    ///
    /// The backtrace records the sends in progress. Callers propagate the
    /// result with `return Err(vm.raise(..))`.
    pub fn raise(&mut self, class: ClassId, message: impl Into<String>) -> Error {
        let message = message.into();
        let value = self.instantiate(class);
        if let Some(Payload::Error { message: slot }) = value
            .as_object()
            .and_then(|r| self.object_mut(r).ok())
            .map(|object| object.payload_mut())
        {
            slot.clone_from(&message);
        }

        let class_name = self.class_name(class).to_string();
        debug!("raise {class_name}: {message}");
        Error::Raised(Exception::new(
            class,
            class_name,
            value,
            message,
            self.backtrace(),
        ))
    }

    /// Runs `body`, handing any exception that is an instance of one of
    /// `classes` (or a subclass) to `handler`.
    ///
    /// Other errors, including non-exception errors, propagate unchanged.
    ///
    /// # Errors
    ///
    /// Unhandled errors from `body`, or whatever `handler` returns.
    pub fn rescue<T>(
        &mut self,
        body: impl FnOnce(&mut Vm) -> Result<T>,
        classes: &[ClassId],
        handler: impl FnOnce(&mut Vm, Exception) -> Result<T>,
    ) -> Result<T> {
        match body(self) {
            Err(Error::Raised(exc))
                if classes
                    .iter()
                    .any(|&class| self.classes.is_subclass_of(exc.class(), class)) =>
            {
                debug!("rescued {exc}");
                handler(self, exc)
            }
            other => other,
        }
    }

    /// Top-level boundary for running host code.
    ///
    /// An error that escapes `body` is logged at Error, with its backtrace,
    /// and returned to the caller. Frames pushed inside `body` are dropped;
    /// sends already in progress when `run` was entered keep theirs.
    ///
    /// # Errors
    ///
    /// Whatever escapes `body`.
    pub fn run<T>(&mut self, body: impl FnOnce(&mut Vm) -> Result<T>) -> Result<T> {
        let depth = self.frames.len();
        let result = body(self);
        self.frames.truncate(depth);

        if let Err(err) = &result {
            error!("uncaught {err}");
            if let Some(exc) = err.exception() {
                for frame in exc.backtrace() {
                    error!("    from {frame}");
                }
            }
        }
        result
    }
}

pub(crate) fn init(vm: &mut Vm) {
    let error = vm.core().error;
    vm.define_method(error, "init", Arity::AtLeast(0), error_init);
    vm.define_method(error, "message", Arity::Fixed(0), error_message);
}

fn error_ref(vm: &mut Vm, this: Value) -> Result<ObjectRef> {
    let error = vm.core().error;
    vm.expect(this, error)?;
    let has_slot = matches!(vm.payload(this), Some(Payload::Error { .. }));
    match this {
        Value::Ref(r) if has_slot => Ok(r),
        _ => {
            let message = format!("{} has no error payload", vm.describe(this));
            Err(vm.raise(vm.core().type_error, message))
        }
    }
}

fn error_init(vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    if args.len() > 1 {
        return Err(vm.arity_error(args.len(), "0..1"));
    }
    let text = match args.first() {
        Some(&arg) => string_str(vm, arg)?,
        None => String::new(),
    };
    let r = error_ref(vm, this)?;
    if let Payload::Error { message } = vm.object_mut(r)?.payload_mut() {
        *message = text;
    }
    Ok(this)
}

fn error_message(vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    let r = error_ref(vm, this)?;
    let text = match vm.object(r)?.payload() {
        Payload::Error { message } => message.clone(),
        _ => String::new(),
    };
    Ok(make_cstring(vm, &text))
}
