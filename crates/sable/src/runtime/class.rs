//! Classes, ancestry and method tables.
//!
//! Classes live in a per-VM [`ClassTable`] and are addressed by [`ClassId`].
//! A class has one optional superclass and an ordered list of included
//! modules (modules are ordinary classes). Classes are never removed.
//!
//! # Lookup order
//!
//! [`ClassTable::ancestors`] linearizes a class as:
//!
//! 1. the class itself
//! 2. each included module in inclusion order, where a module contributes
//!    itself followed by its own included modules (never its superclass)
//! 3. the same walk repeated for the superclass, up to the root
//!
//! A class reached twice keeps its first position. Method lookup returns the
//! first ancestor whose table has the selector.
//!
//! ```
//! use sable::{Arity, Value, Vm};
//!
//! let mut vm = Vm::new();
//! let object = vm.core().object;
//! let greeter = vm.define_class("Greeter", object).unwrap();
//! let loud = vm.define_class("Loud", object).unwrap();
//! vm.define_method(loud, "volume", Arity::Fixed(0), |_, _, _| Ok(Value::Int(11)));
//! vm.include_module(greeter, loud).unwrap();
//!
//! assert_eq!(vm.ancestors(greeter), vec![greeter, loud, object]);
//! let g = vm.instantiate(greeter);
//! assert_eq!(vm.send(g, "volume", &[]).unwrap(), Value::Int(11));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;
use sable_log::debug;
use sable_mem::Symbol;

use crate::error::{Error, Result};
use crate::runtime::method::{Arity, Imp, Method, NativeFn};
use crate::runtime::object::{Allocator, Object, Payload};
use crate::runtime::value::{ObjectRef, Value};
use crate::runtime::vm::Vm;

/// Identifies a class within one VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u32);

impl ClassId {
    pub(crate) const fn new(index: u32) -> Self {
        ClassId(index)
    }

    /// Position in the class table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// A class or module.
pub struct Class {
    name: Box<str>,
    superclass: Option<ClassId>,
    includes: Vec<ClassId>,
    methods: FxHashMap<Symbol, Method>,
    allocator: Option<Allocator>,
}

impl Class {
    fn new(name: &str, superclass: Option<ClassId>) -> Self {
        Class {
            name: name.into(),
            superclass,
            includes: Vec::new(),
            methods: FxHashMap::default(),
            allocator: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    /// Included modules in inclusion order.
    #[must_use]
    pub fn includes(&self) -> &[ClassId] {
        &self.includes
    }

    /// Method defined directly on this class.
    #[must_use]
    pub fn method(&self, selector: Symbol) -> Option<&Method> {
        self.methods.get(&selector)
    }

    /// Methods defined directly on this class, in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    /// Allocator installed on this class itself.
    #[must_use]
    pub fn allocator(&self) -> Option<Allocator> {
        self.allocator
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass)
            .field("includes", &self.includes)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Registry of every class in a VM.
///
/// Lookups go through a `(class, selector) -> owner` cache that is cleared
/// whenever any method table or inclusion list changes.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: Vec<Class>,
    by_name: FxHashMap<Box<str>, ClassId>,
    cache: RefCell<FxHashMap<(ClassId, Symbol), ClassId>>,
}

impl ClassTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a class and binds its name. An existing binding is replaced.
    pub(crate) fn insert(&mut self, name: &str, superclass: Option<ClassId>) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.classes.push(Class::new(name, superclass));
        self.by_name.insert(name.into(), id);
        id
    }

    /// Class `id`, or `None` if this table did not issue it.
    #[must_use]
    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(id.index())
    }

    fn get_mut(&mut self, id: ClassId) -> &mut Class {
        match self.classes.get_mut(id.index()) {
            Some(class) => class,
            None => panic!("{id} does not belong to this VM"),
        }
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Method resolution order of `id`. Empty for foreign ids.
    #[must_use]
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut order = Vec::new();
        let mut current = Some(id);

        while let Some(class_id) = current {
            let Some(class) = self.get(class_id) else {
                break;
            };
            if !order.contains(&class_id) {
                order.push(class_id);
            }
            for &module in &class.includes {
                self.push_module(&mut order, module);
            }
            current = class.superclass;
        }

        order
    }

    fn push_module(&self, order: &mut Vec<ClassId>, module: ClassId) {
        if order.contains(&module) {
            return;
        }
        let Some(class) = self.get(module) else {
            return;
        };
        order.push(module);
        for &inner in &class.includes {
            self.push_module(order, inner);
        }
    }

    /// Finds the method `selector` resolves to for instances of `class`.
    #[must_use]
    pub fn lookup(&self, class: ClassId, selector: Symbol) -> Option<&Method> {
        let cached = self.cache.borrow().get(&(class, selector)).copied();
        if let Some(owner) = cached {
            return self.get(owner).and_then(|c| c.method(selector));
        }

        let owner = self
            .ancestors(class)
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|c| c.methods.contains_key(&selector)))?;
        self.cache.borrow_mut().insert((class, selector), owner);
        self.get(owner).and_then(|c| c.method(selector))
    }

    /// Whether `ancestor` is `class` or on its superclass chain.
    ///
    /// Included modules are not considered.
    #[must_use]
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(Class::superclass);
        }
        false
    }

    /// Allocator of the nearest class on the superclass chain that has one.
    #[must_use]
    pub fn allocator_for(&self, class: ClassId) -> Option<Allocator> {
        let mut current = Some(class);
        while let Some(id) = current {
            let class = self.get(id)?;
            if let Some(allocator) = class.allocator {
                return Some(allocator);
            }
            current = class.superclass;
        }
        None
    }

    pub(crate) fn add_method(&mut self, class: ClassId, method: Method) {
        self.get_mut(class).methods.insert(method.name(), method);
        self.invalidate_cache();
    }

    /// Appends `module` to `class`'s inclusion list.
    ///
    /// Returns `false` if it was already included.
    pub(crate) fn include(&mut self, class: ClassId, module: ClassId) -> Result<bool> {
        let mut reachable = Vec::new();
        self.push_module(&mut reachable, module);
        if reachable.contains(&class) {
            return Err(Error::InheritanceCycle);
        }

        let target = self.get_mut(class);
        if target.includes.contains(&module) {
            return Ok(false);
        }
        target.includes.push(module);
        self.invalidate_cache();
        Ok(true)
    }

    pub(crate) fn set_allocator(&mut self, class: ClassId, allocator: Allocator) {
        self.get_mut(class).allocator = Some(allocator);
    }

    /// Drops every cached lookup.
    pub fn invalidate_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    /// Number of cached lookups.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl Vm {
    /// Defines class `name` under `superclass`.
    ///
    /// Reopening a class with the superclass it already has returns the
    /// existing class, so methods can be added to it.
    ///
    /// # Errors
    ///
    /// Raises `TypeError` if `name` is bound to a class with a different
    /// superclass.
    ///
    /// # Panics
    ///
    /// Panics if `superclass` was not created by this VM.
    pub fn define_class(&mut self, name: &str, superclass: ClassId) -> Result<ClassId> {
        assert!(self.classes.get(superclass).is_some(), "{superclass} does not belong to this VM");

        if let Some(existing) = self.classes.by_name(name) {
            if self.superclass(existing) == Some(superclass) {
                return Ok(existing);
            }
            let type_error = self.core().type_error;
            return Err(self.raise(type_error, format!("superclass mismatch for class {name}")));
        }

        let id = self.classes.insert(name, Some(superclass));
        debug!("defined class {} < {}", name, self.class_name(superclass));
        Ok(id)
    }

    /// Defines `<outer>::<name>` under `object_super` with the class
    /// `included_in` mixed in.
    ///
    /// This is how `Range::Enumerator` gains access to `Range`'s methods
    /// without being a `Range`.
    ///
    /// # Errors
    ///
    /// Raises `TypeError` if the qualified name is already bound with a
    /// different superclass or without `included_in` mixed in.
    ///
    /// # Panics
    ///
    /// Panics if either class was not created by this VM.
    pub fn define_class_as_module(
        &mut self,
        name: &str,
        object_super: ClassId,
        included_in: ClassId,
    ) -> Result<ClassId> {
        let qualified = format!("{}::{name}", self.class_name(included_in));

        if let Some(existing) = self.classes.by_name(&qualified) {
            let compatible = self.classes.get(existing).is_some_and(|c| {
                c.superclass == Some(object_super) && c.includes.contains(&included_in)
            });
            if compatible {
                return Ok(existing);
            }
            let type_error = self.core().type_error;
            return Err(self.raise(type_error, format!("superclass mismatch for class {qualified}")));
        }

        let id = self.define_class(&qualified, object_super)?;
        self.include_module(id, included_in)?;
        Ok(id)
    }

    /// Installs the payload constructor for `class` and its subclasses.
    ///
    /// # Panics
    ///
    /// Panics if `class` was not created by this VM.
    pub fn set_allocator(&mut self, class: ClassId, allocator: Allocator) {
        self.classes.set_allocator(class, allocator);
    }

    /// Installs a builtin method, replacing any method of the same name on
    /// `class`.
    ///
    /// # Panics
    ///
    /// Panics if `class` was not created by this VM.
    pub fn define_method(&mut self, class: ClassId, name: &str, arity: Arity, f: NativeFn) {
        self.install(class, name, arity, Imp::Native(f));
    }

    /// Installs a closure as a method.
    ///
    /// # Panics
    ///
    /// Panics if `class` was not created by this VM.
    pub fn define_host_method<F>(&mut self, class: ClassId, name: &str, arity: Arity, f: F)
    where
        F: Fn(&mut Vm, Value, &[Value]) -> Result<Value> + 'static,
    {
        self.install(class, name, arity, Imp::Host(Rc::new(f)));
    }

    fn install(&mut self, class: ClassId, name: &str, arity: Arity, imp: Imp) {
        let selector = self.intern(name);
        self.classes.add_method(class, Method::new(selector, arity, imp, class));
        debug!("defined method {}#{} ({})", self.class_name(class), name, arity);
    }

    /// Mixes `module` into `class`. Including a module twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InheritanceCycle`] if `module` already includes
    /// `class`, directly or through its own modules.
    ///
    /// # Panics
    ///
    /// Panics if `class` was not created by this VM.
    pub fn include_module(&mut self, class: ClassId, module: ClassId) -> Result<()> {
        if self.classes.include(class, module)? {
            debug!("included {} in {}", self.class_name(module), self.class_name(class));
        }
        Ok(())
    }

    /// Allocates an instance of `class` without running `init`.
    pub fn instantiate(&mut self, class: ClassId) -> Value {
        let payload = match self.classes.allocator_for(class) {
            Some(allocate) => allocate(self),
            None => Payload::Plain,
        };
        let handle = self.objects.alloc(Object::new(class, payload));
        Value::Ref(ObjectRef::new(handle))
    }

    #[must_use]
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        self.classes.ancestors(class)
    }

    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes.by_name(name)
    }

    /// Name of `class`, or `"?"` for a foreign id.
    #[must_use]
    pub fn class_name(&self, class: ClassId) -> &str {
        self.classes.get(class).map_or("?", Class::name)
    }

    #[must_use]
    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        self.classes.get(class).and_then(Class::superclass)
    }

    #[must_use]
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.classes.is_subclass_of(class, ancestor)
    }

    /// Names of the methods defined directly on `class`, sorted.
    #[must_use]
    pub fn instance_methods(&self, class: ClassId) -> Vec<&str> {
        let Some(class) = self.classes.get(class) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = class
            .methods()
            .map(|m| self.symbol_name(m.name()))
            .collect();
        names.sort_unstable();
        names
    }

    /// Class whose method `name` instances of `class` would run.
    #[must_use]
    pub fn method_owner(&self, class: ClassId, name: &str) -> Option<ClassId> {
        let selector = self.symbols.get(name)?;
        self.classes.lookup(class, selector).map(Method::owner)
    }

    /// The class table.
    #[must_use]
    pub fn class_table(&self) -> &ClassTable {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(owner: ClassId, name: u32) -> Method {
        Method::new(
            Symbol::new(name),
            Arity::Fixed(0),
            Imp::Native(|_, _, _| Ok(Value::Nil)),
            owner,
        )
    }

    fn table() -> (ClassTable, ClassId) {
        let mut table = ClassTable::new();
        let root = table.insert("Object", None);
        (table, root)
    }

    #[test]
    fn test_superclass_chain_order() {
        let (mut table, root) = table();
        let a = table.insert("A", Some(root));
        let b = table.insert("B", Some(a));

        assert_eq!(table.ancestors(b), vec![b, a, root]);
        assert!(table.is_subclass_of(b, root));
        assert!(!table.is_subclass_of(a, b));
    }

    #[test]
    fn test_modules_precede_superclass() {
        let (mut table, root) = table();
        let s = table.insert("S", Some(root));
        let m1 = table.insert("M1", Some(root));
        let m2 = table.insert("M2", Some(root));
        let c = table.insert("C", Some(s));
        table.include(c, m1).unwrap();
        table.include(c, m2).unwrap();

        assert_eq!(table.ancestors(c), vec![c, m1, m2, s, root]);
    }

    #[test]
    fn test_module_contributes_its_includes_not_its_superclass() {
        let (mut table, root) = table();
        let base = table.insert("Base", Some(root));
        let inner = table.insert("Inner", Some(root));
        let module = table.insert("Module", Some(base));
        table.include(module, inner).unwrap();
        let c = table.insert("C", Some(root));
        table.include(c, module).unwrap();

        assert_eq!(table.ancestors(c), vec![c, module, inner, root]);
    }

    #[test]
    fn test_first_match_wins() {
        let (mut table, root) = table();
        let m1 = table.insert("M1", Some(root));
        let m2 = table.insert("M2", Some(root));
        let c = table.insert("C", Some(root));
        table.include(c, m1).unwrap();
        table.include(c, m2).unwrap();

        let shared = method(m2, 50);
        table.add_method(m2, shared);
        assert_eq!(table.lookup(c, Symbol::new(50)).map(Method::owner), Some(m2));

        let shadow = method(m1, 50);
        table.add_method(m1, shadow);
        assert_eq!(table.lookup(c, Symbol::new(50)).map(Method::owner), Some(m1));
    }

    #[test]
    fn test_cache_is_invalidated_on_change() {
        let (mut table, root) = table();
        let c = table.insert("C", Some(root));
        let m = method(root, 60);
        table.add_method(root, m);

        assert_eq!(table.lookup(c, Symbol::new(60)).map(Method::owner), Some(root));
        assert_eq!(table.cache_len(), 1);

        let m = method(c, 60);
        table.add_method(c, m);
        assert_eq!(table.cache_len(), 0);
        assert_eq!(table.lookup(c, Symbol::new(60)).map(Method::owner), Some(c));
    }

    #[test]
    fn test_include_rejects_cycles_and_duplicates() {
        let (mut table, root) = table();
        let a = table.insert("A", Some(root));
        let b = table.insert("B", Some(root));

        assert_eq!(table.include(a, b), Ok(true));
        assert_eq!(table.include(a, b), Ok(false));
        assert_eq!(table.include(b, a), Err(Error::InheritanceCycle));
        assert_eq!(table.include(a, a), Err(Error::InheritanceCycle));
    }

    #[test]
    fn test_allocator_inherited_through_superclass_only() {
        fn allocate(_: &mut Vm) -> Payload {
            Payload::Str(String::new())
        }

        let (mut table, root) = table();
        let base = table.insert("Base", Some(root));
        let child = table.insert("Child", Some(base));
        let mixer = table.insert("Mixer", Some(root));
        table.set_allocator(base, allocate);
        table.include(mixer, base).unwrap();

        assert!(table.allocator_for(child).is_some());
        assert!(table.allocator_for(mixer).is_none());
    }

    #[test]
    fn test_foreign_ids_are_harmless() {
        let (table, _) = table();
        let foreign = ClassId::new(99);

        assert!(table.ancestors(foreign).is_empty());
        assert!(table.lookup(foreign, Symbol::new(0)).is_none());
        assert!(table.get(foreign).is_none());
    }
}
