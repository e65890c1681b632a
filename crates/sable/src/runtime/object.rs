//! Heap objects and their payload shapes.
//!
//! Every object records its class and carries one [`Payload`], chosen by the
//! allocator of the nearest ancestor class that has one. Host-defined classes
//! without a native shape use [`Payload::Plain`] and keep their state in
//! instance variables.

use fxhash::FxHashMap;
use sable_mem::Symbol;

use crate::runtime::class::ClassId;
use crate::runtime::range::{EnumeratorData, RangeData};
use crate::runtime::value::Value;
use crate::runtime::vm::Vm;

/// Native state attached to an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Payload {
    /// No native state.
    #[default]
    Plain,
    /// Text of a `String`.
    Str(String),
    /// Bounds of a `Range`.
    Range(RangeData),
    /// Cursor of a `Range::Enumerator`.
    RangeEnumerator(EnumeratorData),
    /// Message of an `Error`.
    Error {
        /// Text returned by `Error#message`.
        message: String,
    },
}

/// Builds the payload for a new instance.
pub type Allocator = fn(&mut Vm) -> Payload;

/// A heap object.
#[derive(Debug, Clone)]
pub struct Object {
    class: ClassId,
    ivars: FxHashMap<Symbol, Value>,
    payload: Payload,
}

impl Object {
    pub(crate) fn new(class: ClassId, payload: Payload) -> Self {
        Object {
            class,
            ivars: FxHashMap::default(),
            payload,
        }
    }

    #[must_use]
    pub fn class(&self) -> ClassId {
        self.class
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    /// Instance variable `name`, or `nil` if unset.
    #[must_use]
    pub fn ivar(&self, name: Symbol) -> Value {
        self.ivars.get(&name).copied().unwrap_or_default()
    }

    pub fn set_ivar(&mut self, name: Symbol, value: Value) {
        self.ivars.insert(name, value);
    }

    /// Number of instance variables set.
    #[must_use]
    pub fn ivar_count(&self) -> usize {
        self.ivars.len()
    }
}
