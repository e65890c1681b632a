//! Message sends and capability probes.
//!
//! A send resolves the selector against the receiver's class ancestry,
//! checks the argument count against the method's [`Arity`], pushes a call
//! frame and runs the body. Failures are raised as language exceptions:
//!
//! | Condition | Class | Message |
//! |---|---|---|
//! | no method found | `NoMethodError` | `undefined method 'name' for Class` |
//! | argument count | `ArgumentError` | `wrong number of arguments (n for arity)` |
//! | nesting too deep | `StackError` | `stack level too deep` |
//!
//! [`Vm::responds_to`] performs the same lookup without running anything and
//! never fails.

use std::fmt;

use sable_log::trace;
use sable_mem::Symbol;

use crate::error::{Error, Result};
use crate::runtime::method::Arity;
use crate::runtime::value::Value;
use crate::runtime::vm::{Frame, Vm};

impl Vm {
    /// Sends `name` to `receiver`.
    ///
    /// # Errors
    ///
    /// `NoMethodError`, `ArgumentError` or `StackError` as described in the
    /// module docs, anything the method raises, or
    /// [`Error::StaleReference`](crate::Error::StaleReference) for a dead
    /// receiver.
    ///
    /// # Example
    ///
    /// ```
    /// use sable::{Value, Vm};
    ///
    /// let mut vm = Vm::new();
    /// let err = vm.send(Value::Int(1), "succ", &[]).unwrap_err();
    /// assert_eq!(err.to_string(), "NoMethodError: undefined method 'succ' for Int");
    /// ```
    pub fn send(&mut self, receiver: Value, name: &str, args: &[Value]) -> Result<Value> {
        let selector = self.intern(name);
        self.send_id(receiver, selector, args)
    }

    /// Sends an already-interned selector.
    ///
    /// # Errors
    ///
    /// See [`Vm::send`].
    pub fn send_id(&mut self, receiver: Value, selector: Symbol, args: &[Value]) -> Result<Value> {
        let class = self.class_of(receiver)?;
        trace!(
            "send {}#{} ({} args)",
            self.class_name(class),
            self.symbol_name(selector),
            args.len()
        );

        let Some(method) = self.classes.lookup(class, selector) else {
            let message = format!(
                "undefined method '{}' for {}",
                self.symbol_name(selector),
                self.class_name(class)
            );
            return Err(self.raise(self.core().no_method_error, message));
        };
        let (arity, owner, imp) = (method.arity(), method.owner(), method.imp().clone());

        if !arity.accepts(args.len()) {
            return Err(self.arity_error(args.len(), arity));
        }
        if self.frames.len() >= self.config().max_call_depth {
            return Err(self.raise(self.core().stack_error, "stack level too deep"));
        }

        self.frames.push(Frame {
            class: owner,
            selector,
        });
        let result = imp.call(self, receiver, args);
        self.frames.pop();
        result
    }

    pub(crate) fn arity_error(&mut self, argc: usize, arity: impl fmt::Display) -> Error {
        let message = format!("wrong number of arguments ({argc} for {arity})");
        self.raise(self.core().argument_error, message)
    }

    /// Whether `receiver` would find a method called `name`.
    #[must_use]
    pub fn responds_to(&self, receiver: Value, name: &str) -> bool {
        self.symbols
            .get(name)
            .is_some_and(|selector| self.responds_to_id(receiver, selector))
    }

    /// Interned variant of [`Vm::responds_to`].
    #[must_use]
    pub fn responds_to_id(&self, receiver: Value, selector: Symbol) -> bool {
        self.class_of(receiver)
            .is_ok_and(|class| self.classes.lookup(class, selector).is_some())
    }

    /// Declared arity of the method `receiver` would run for `name`.
    #[must_use]
    pub fn arity_of(&self, receiver: Value, name: &str) -> Option<Arity> {
        let selector = self.symbols.get(name)?;
        let class = self.class_of(receiver).ok()?;
        self.classes.lookup(class, selector).map(|m| m.arity())
    }
}
