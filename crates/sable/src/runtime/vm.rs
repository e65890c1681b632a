//! The virtual machine: object pool, class table, scopes and call frames.
//!
//! A [`Vm`] owns everything its values point into. Nothing is shared between
//! VMs, so several can run in one process as long as values, class ids and
//! symbols are never passed from one to another.
//!
//! # Scopes
//!
//! [`Vm::scope`] brackets a region of work. Objects allocated inside it are
//! released when it returns, together with the scratch arena that served
//! [`Vm::alloc_buffer`]. A reference that escapes the scope fails with
//! [`Error::StaleReference`] when next used.
//!
//! ```
//! use sable::{Error, Vm, string};
//!
//! let mut vm = Vm::new();
//! let escaped = vm.scope(|vm| Ok(string::make_cstring(vm, "temporary"))).unwrap();
//! assert!(matches!(vm.class_of(escaped), Err(Error::StaleReference { .. })));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use sable_log::{trace, warn};
use sable_mem::{Arena, ArenaFactory, Pool, Symbol, SymbolTable};

use crate::config::VmConfig;
use crate::error::{Error, Result};
use crate::runtime::class::{ClassId, ClassTable};
use crate::runtime::object::{Object, Payload};
use crate::runtime::value::{ObjectRef, Value};
use crate::runtime::{exception, range, string, symbols};

/// Ids of the classes every VM starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreClasses {
    pub object: ClassId,
    pub nil_class: ClassId,
    pub true_class: ClassId,
    pub false_class: ClassId,
    /// Class of immediate integers. Numeric methods are left to the host.
    pub int: ClassId,
    pub string: ClassId,
    pub enumerable: ClassId,
    pub range: ClassId,
    pub range_enumerator: ClassId,
    pub error: ClassId,
    pub no_method_error: ClassId,
    pub argument_error: ClassId,
    pub type_error: ClassId,
    pub stack_error: ClassId,
}

impl CoreClasses {
    fn bootstrap(table: &mut ClassTable) -> Self {
        let object = table.insert("Object", None);
        let string = table.insert("String", Some(object));
        let enumerable = table.insert("Enumerable", Some(object));
        let range = table.insert("Range", Some(enumerable));
        let range_enumerator = table.insert("Range::Enumerator", Some(object));
        let error = table.insert("Error", Some(object));

        table.set_allocator(string, string::allocate_string);
        table.set_allocator(range, range::allocate_range);
        table.set_allocator(range_enumerator, range::allocate_range_enumerator);
        table.set_allocator(error, exception::allocate_error);
        // Fresh table: inclusion cannot form a cycle.
        let _ = table.include(range_enumerator, range);

        CoreClasses {
            object,
            nil_class: table.insert("NilClass", Some(object)),
            true_class: table.insert("TrueClass", Some(object)),
            false_class: table.insert("FalseClass", Some(object)),
            int: table.insert("Int", Some(object)),
            string,
            enumerable,
            range,
            range_enumerator,
            error,
            no_method_error: table.insert("NoMethodError", Some(error)),
            argument_error: table.insert("ArgumentError", Some(error)),
            type_error: table.insert("TypeError", Some(error)),
            stack_error: table.insert("StackError", Some(error)),
        }
    }
}

/// An active send, used for backtraces and the depth limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) class: ClassId,
    pub(crate) selector: Symbol,
}

/// A runtime instance.
pub struct Vm {
    config: VmConfig,
    pub(crate) classes: ClassTable,
    pub(crate) symbols: SymbolTable,
    pub(crate) objects: Pool<Object>,
    pub(crate) frames: Vec<Frame>,
    factory: ArenaFactory,
    /// Scratch arenas, one per open scope; the last is current.
    arenas: Vec<Arena>,
    lib: CoreClasses,
    cwd: PathBuf,
}

impl Vm {
    /// Creates a VM with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Creates a VM and registers the core classes and their methods.
    #[must_use]
    pub fn with_config(config: VmConfig) -> Self {
        if let Some(level) = config.log_level {
            sable_log::set_level(level);
        }

        let mut classes = ClassTable::new();
        let lib = CoreClasses::bootstrap(&mut classes);
        let factory = ArenaFactory::new(config.arena_chunk_size);
        let cwd = match std::env::current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                warn!("cannot read working directory: {err}");
                PathBuf::from("/")
            }
        };

        let mut vm = Vm {
            classes,
            symbols: SymbolTable::with_reserved(symbols::RESERVED),
            objects: Pool::new(),
            frames: Vec::new(),
            arenas: vec![factory.create_arena()],
            factory,
            lib,
            cwd,
            config,
        };

        init_object(&mut vm);
        string::init(&mut vm);
        exception::init(&mut vm);
        range::init(&mut vm);
        vm
    }

    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    #[must_use]
    pub fn core(&self) -> &CoreClasses {
        &self.lib
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    /// Text of `symbol`, or `"?"` if this VM did not issue it.
    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.symbols.resolve(symbol).unwrap_or("?")
    }

    /// Resolves a reference.
    ///
    /// # Errors
    ///
    /// [`Error::StaleReference`] if the object's scope has ended.
    pub fn object(&self, r: ObjectRef) -> Result<&Object> {
        self.objects
            .get(r.handle())
            .ok_or(Error::StaleReference { index: r.index() })
    }

    /// Mutable variant of [`Vm::object`].
    ///
    /// # Errors
    ///
    /// [`Error::StaleReference`] if the object's scope has ended.
    pub fn object_mut(&mut self, r: ObjectRef) -> Result<&mut Object> {
        self.objects
            .get_mut(r.handle())
            .ok_or(Error::StaleReference { index: r.index() })
    }

    pub(crate) fn payload(&self, value: Value) -> Option<&Payload> {
        let r = value.as_object()?;
        self.objects.get(r.handle()).map(Object::payload)
    }

    /// Class of any value.
    ///
    /// # Errors
    ///
    /// [`Error::StaleReference`] for a reference whose scope has ended.
    pub fn class_of(&self, value: Value) -> Result<ClassId> {
        match value {
            Value::Nil => Ok(self.lib.nil_class),
            Value::Bool(true) => Ok(self.lib.true_class),
            Value::Bool(false) => Ok(self.lib.false_class),
            Value::Int(_) => Ok(self.lib.int),
            Value::Ref(r) => self.object(r).map(Object::class),
        }
    }

    /// Whether `value`'s class is `class` or inherits from it.
    #[must_use]
    pub fn is_a(&self, value: Value, class: ClassId) -> bool {
        self.class_of(value)
            .is_ok_and(|own| self.classes.is_subclass_of(own, class))
    }

    /// Raises `TypeError` unless `value` is a `class`.
    ///
    /// # Errors
    ///
    /// `TypeError` ("Expected <Class>, got <Class>") on mismatch, or
    /// [`Error::StaleReference`].
    pub fn expect(&mut self, value: Value, class: ClassId) -> Result<()> {
        let own = self.class_of(value)?;
        if self.classes.is_subclass_of(own, class) {
            return Ok(());
        }
        let message = format!(
            "Expected {}, got {}",
            self.class_name(class),
            self.class_name(own)
        );
        Err(self.raise(self.lib.type_error, message))
    }

    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub fn is_truthy(&self, value: Value) -> bool {
        value.is_truthy()
    }

    /// Instance variable of an object; `nil` if unset or if `value` is an
    /// immediate.
    ///
    /// # Errors
    ///
    /// [`Error::StaleReference`].
    pub fn ivar_get(&self, value: Value, name: &str) -> Result<Value> {
        let Value::Ref(r) = value else {
            return Ok(Value::Nil);
        };
        let object = self.object(r)?;
        Ok(self
            .symbols
            .get(name)
            .map_or(Value::Nil, |sym| object.ivar(sym)))
    }

    /// Sets an instance variable.
    ///
    /// # Errors
    ///
    /// `TypeError` for immediates, or [`Error::StaleReference`].
    pub fn ivar_set(&mut self, value: Value, name: &str, ivar: Value) -> Result<()> {
        let Value::Ref(r) = value else {
            let message = format!("can't set instance variable on {}", self.describe(value));
            return Err(self.raise(self.lib.type_error, message));
        };
        let sym = self.intern(name);
        self.object_mut(r)?.set_ivar(sym, ivar);
        Ok(())
    }

    /// Instantiates `class` and sends it `init` with `args`.
    ///
    /// # Errors
    ///
    /// Whatever `init` raises.
    pub fn new_instance(&mut self, class: ClassId, args: &[Value]) -> Result<Value> {
        let instance = self.instantiate(class);
        self.send_id(instance, symbols::INIT, args)?;
        Ok(instance)
    }

    /// Debug rendering that never fails.
    #[must_use]
    pub fn describe(&self, value: Value) -> String {
        let Value::Ref(r) = value else {
            return value.to_string();
        };
        let Ok(object) = self.object(r) else {
            return format!("#<stale {}>", r.index());
        };
        match object.payload() {
            Payload::Str(s) => format!("{s:?}"),
            Payload::Range(data) => format!(
                "{}{}{}",
                self.describe_endpoint(data.left),
                if data.exclusive { "..." } else { ".." },
                self.describe_endpoint(data.right)
            ),
            Payload::Error { message } => {
                format!("#<{}: {message}>", self.class_name(object.class()))
            }
            Payload::Plain | Payload::RangeEnumerator(_) => {
                format!("#<{}:{}>", self.class_name(object.class()), r.index())
            }
        }
    }

    /// Ranges used as endpoints render by identity, so a range that holds
    /// itself still terminates.
    fn describe_endpoint(&self, value: Value) -> String {
        match (value, self.payload(value)) {
            (Value::Ref(r), Some(Payload::Range(_))) => {
                let class = self.class_of(value).map_or("?", |c| self.class_name(c));
                format!("#<{class}:{}>", r.index())
            }
            _ => self.describe(value),
        }
    }

    /// Runs `f` in a nested scope.
    ///
    /// On return, normal or not, every object allocated inside is released
    /// and the scope's scratch arena is dropped.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns.
    pub fn scope<T>(&mut self, f: impl FnOnce(&mut Vm) -> Result<T>) -> Result<T> {
        let mark = self.objects.mark();
        let depth = self.arenas.len();
        self.arenas.push(self.factory.create_arena());
        trace!("enter scope {depth} ({} live objects)", self.objects.len());

        let result = f(self);

        self.arenas.truncate(depth);
        let released = self.objects.len();
        self.objects.release(mark);
        trace!(
            "leave scope {depth} (released {} objects)",
            released - self.objects.len()
        );
        result
    }

    /// Nesting depth of [`Vm::scope`]; 0 at top level.
    #[must_use]
    pub fn scope_depth(&self) -> usize {
        self.arenas.len() - 1
    }

    fn arena(&self) -> &Arena {
        match self.arenas.last() {
            Some(arena) => arena,
            None => unreachable!("the root arena is never popped"),
        }
    }

    /// Zeroed scratch bytes valid until the current scope ends.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_buffer(&self, len: usize) -> &mut [u8] {
        self.arena().alloc_bytes(len)
    }

    /// Copies `s` into the current scope's arena.
    pub fn alloc_str(&self, s: &str) -> &str {
        self.arena().alloc_str(s)
    }

    /// Number of live objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Working directory used to resolve relative paths.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn set_cwd(&mut self, path: impl Into<PathBuf>) {
        self.cwd = path.into();
    }

    /// Number of sends in progress.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// `Class#method` for each send in progress, innermost first.
    #[must_use]
    pub fn backtrace(&self) -> Vec<String> {
        self.frames
            .iter()
            .rev()
            .map(|frame| {
                format!(
                    "{}#{}",
                    self.class_name(frame.class),
                    self.symbol_name(frame.selector)
                )
            })
            .collect()
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("classes", &self.classes.len())
            .field("symbols", &self.symbols.len())
            .field("objects", &self.objects.len())
            .field("call_depth", &self.frames.len())
            .field("scope_depth", &self.scope_depth())
            .finish()
    }
}

fn init_object(vm: &mut Vm) {
    use crate::runtime::method::Arity;

    let object = vm.lib.object;
    vm.define_method(object, "init", Arity::AtLeast(0), object_init);
    vm.define_method(object, "==", Arity::Fixed(1), object_eq);
    vm.define_method(object, "responds_to?", Arity::Fixed(1), object_responds_to);
}

fn object_init(_vm: &mut Vm, this: Value, _args: &[Value]) -> Result<Value> {
    Ok(this)
}

fn object_eq(_vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(this == args[0]))
}

fn object_responds_to(vm: &mut Vm, this: Value, args: &[Value]) -> Result<Value> {
    let responds = match vm.payload(args[0]) {
        Some(Payload::Str(name)) => vm.responds_to(this, name),
        _ => false,
    };
    Ok(Value::Bool(responds))
}
