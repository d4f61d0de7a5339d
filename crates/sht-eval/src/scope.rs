//! Lexical scopes and variable references.
//!
//! A scope maps names to shared references and points at its parent.
//! Closures keep their defining scope alive by holding a `Scope` handle,
//! so handles are reference counted and interior mutable.
//!
//! Every scope also registers itself, weakly, with the root it descends
//! from. A closure or generator stored in the scope it captures forms a
//! cycle that reference counting never frees; `clear_all` on the root
//! drops the bindings of every registered scope and breaks those cycles.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::error::RuntimeError;
use crate::generator::Yielder;
use crate::value::{lock, Instance};

#[derive(Debug)]
struct Binding {
    value: Instance,
    constant: bool,
}

/// A variable cell shared by every scope lookup that resolves to it.
#[derive(Clone, Debug)]
pub struct Reference {
    cell: Arc<Mutex<Binding>>,
}

impl Reference {
    fn new(value: Instance, constant: bool) -> Self {
        Self {
            cell: Arc::new(Mutex::new(Binding { value, constant })),
        }
    }

    pub fn get(&self) -> Instance {
        lock(&self.cell).value.clone()
    }

    pub fn is_constant(&self) -> bool {
        lock(&self.cell).constant
    }

    /// Replace the value, refusing constants.
    pub fn set(&self, name: &str, value: Instance) -> Result<(), RuntimeError> {
        let mut binding = lock(&self.cell);
        if binding.constant {
            return Err(RuntimeError::ConstantReassignment(name.to_string()));
        }
        binding.value = value;
        Ok(())
    }
}

/// Weak handles to every scope sharing one root.
#[derive(Default)]
struct Registry {
    scopes: Mutex<Vec<Weak<ScopeInner>>>,
}

impl Registry {
    fn track(&self, scope: &Arc<ScopeInner>) {
        let mut scopes = lock(&self.scopes);
        if scopes.len() == scopes.capacity() {
            scopes.retain(|s| s.strong_count() > 0);
            // Keep pruning amortized when most scopes are still alive.
            if scopes.len() * 2 > scopes.capacity() {
                let additional = scopes.len();
                scopes.reserve(additional);
            }
        }
        scopes.push(Arc::downgrade(scope));
    }

    fn live(&self) -> Vec<Scope> {
        lock(&self.scopes)
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Scope { inner })
            .collect()
    }
}

struct ScopeInner {
    parent: Option<Scope>,
    bindings: Mutex<HashMap<String, Reference>>,
    yielder: Option<Arc<Yielder>>,
    registry: Arc<Registry>,
}

/// A lexical scope.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Create a root scope with no bindings.
    pub fn new() -> Self {
        Self::with_parent(None, None)
    }

    fn with_parent(parent: Option<Scope>, yielder: Option<Arc<Yielder>>) -> Self {
        let registry = match &parent {
            Some(p) => Arc::clone(&p.inner.registry),
            None => Arc::new(Registry::default()),
        };
        let inner = Arc::new(ScopeInner {
            parent,
            bindings: Mutex::new(HashMap::new()),
            yielder,
            registry,
        });
        inner.registry.track(&inner);
        Self { inner }
    }

    /// Create a nested scope.
    pub fn child(&self) -> Scope {
        Self::with_parent(Some(self.clone()), None)
    }

    /// Create the body scope of a generator; `yield` inside it suspends
    /// through `yielder`.
    pub(crate) fn generator_child(&self, yielder: Arc<Yielder>) -> Scope {
        Self::with_parent(Some(self.clone()), Some(yielder))
    }

    /// Nearest generator link, if this scope runs inside a generator body.
    pub(crate) fn yielder(&self) -> Option<Arc<Yielder>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(y) = &scope.inner.yielder {
                return Some(Arc::clone(y));
            }
            current = scope.inner.parent.as_ref();
        }
        None
    }

    /// Define a new variable in this scope.
    pub fn define(
        &self,
        name: &str,
        value: Instance,
        constant: bool,
    ) -> Result<Reference, RuntimeError> {
        let mut bindings = lock(&self.inner.bindings);
        if bindings.contains_key(name) {
            return Err(RuntimeError::AlreadyDefined(name.to_string()));
        }
        let reference = Reference::new(value, constant);
        bindings.insert(name.to_string(), reference.clone());
        Ok(reference)
    }

    /// Find the nearest reference for `name`.
    pub fn lookup(&self, name: &str) -> Option<Reference> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(r) = lock(&scope.inner.bindings).get(name) {
                return Some(r.clone());
            }
            current = scope.inner.parent.as_ref();
        }
        None
    }

    /// Read a variable.
    pub fn get(&self, name: &str) -> Result<Instance, RuntimeError> {
        self.lookup(name)
            .map(|r| r.get())
            .ok_or_else(|| RuntimeError::Undefined(name.to_string()))
    }

    /// Assign through the nearest existing reference. Closures holding the
    /// same reference observe the new value.
    pub fn assign(&self, name: &str, value: Instance) -> Result<(), RuntimeError> {
        match self.lookup(name) {
            Some(reference) => reference.set(name, value),
            None => Err(RuntimeError::Undefined(name.to_string())),
        }
    }

    /// Whether `name` is bound directly in this scope.
    pub fn contains_local(&self, name: &str) -> bool {
        lock(&self.inner.bindings).contains_key(name)
    }

    /// Drop every binding of this scope.
    ///
    /// Breaks reference cycles between closures, generators and the scope
    /// that holds them once a run is over.
    pub fn clear(&self) {
        let drained: Vec<Reference> = lock(&self.inner.bindings).drain().map(|(_, r)| r).collect();
        drop(drained);
    }

    /// Clear every live scope that shares this scope's root, including
    /// call scopes that only a closure or a parked generator still reaches.
    pub fn clear_all(&self) {
        for scope in self.inner.registry.live() {
            scope.clear();
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = lock(&self.inner.bindings).keys().cloned().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("nested", &self.inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let scope = Scope::new();
        scope.define("x", Instance::Number(1.0), false).unwrap();
        assert!(matches!(scope.get("x"), Ok(Instance::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_duplicate_definition_fails() {
        let scope = Scope::new();
        scope.define("x", Instance::Number(1.0), false).unwrap();
        let err = scope.define("x", Instance::Number(2.0), false).unwrap_err();
        assert_eq!(err, RuntimeError::AlreadyDefined("x".into()));
    }

    #[test]
    fn test_child_shadows_parent() {
        let parent = Scope::new();
        parent.define("b", Instance::Number(1.0), false).unwrap();
        let child = parent.child();
        child.define("b", Instance::Number(5.0), false).unwrap();
        assert!(matches!(child.get("b"), Ok(Instance::Number(n)) if n == 5.0));
        assert!(matches!(parent.get("b"), Ok(Instance::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_assign_updates_nearest_reference() {
        let parent = Scope::new();
        parent.define("b", Instance::Number(1.0), false).unwrap();
        let child = parent.child();
        child.assign("b", Instance::Number(5.0)).unwrap();
        assert!(matches!(parent.get("b"), Ok(Instance::Number(n)) if n == 5.0));
        assert!(!child.contains_local("b"));
    }

    #[test]
    fn test_assign_requires_existing_binding() {
        let parent = Scope::new();
        let child = parent.child();
        let err = child.assign("fresh", Instance::Boolean(true)).unwrap_err();
        assert_eq!(err, RuntimeError::Undefined("fresh".into()));
        assert!(!child.contains_local("fresh"));
    }

    #[test]
    fn test_constant_cannot_be_reassigned() {
        let scope = Scope::new();
        scope.define("c", Instance::Number(1.0), true).unwrap();
        let err = scope.assign("c", Instance::Number(2.0)).unwrap_err();
        assert_eq!(err, RuntimeError::ConstantReassignment("c".into()));
    }

    #[test]
    fn test_clear_all_reaches_nested_scopes() {
        let root = Scope::new();
        let call = root.child().child();
        call.define("local", Instance::Number(1.0), false).unwrap();
        root.clear_all();
        assert!(!call.contains_local("local"));
    }

    #[test]
    fn test_clear_all_breaks_self_reference() {
        let root = Scope::new();
        let call = root.child();
        let weak = Arc::downgrade(&call.inner);
        // A closure-like value stored in the scope it captures.
        let capture = call.clone();
        let closure = crate::types::function::FunctionValue::native("f", move |_rt, _args| {
            Ok(Instance::Boolean(capture.contains_local("f")))
        });
        call.define("f", closure, false).unwrap();
        drop(call);
        assert!(weak.upgrade().is_some());
        root.clear_all();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_registry_prunes_dropped_scopes() {
        let root = Scope::new();
        for _ in 0..1000 {
            let _ = root.child();
        }
        assert!(lock(&root.inner.registry.scopes).len() < 100);
        assert_eq!(root.inner.registry.live().len(), 1);
    }

    #[test]
    fn test_undefined_lookup() {
        let scope = Scope::new();
        assert_eq!(scope.get("nope").unwrap_err(), RuntimeError::Undefined("nope".into()));
    }
}
