use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::object::Object;

/// A lexical scope mapping names to runtime values.
///
/// Environments form a chain through the `outer` link. They are shared:
/// every closure created while a scope is active keeps it alive, as does
/// any call frame still evaluating inside it, so frames live behind
/// `Rc<RefCell<...>>` rather than in a single-owner tree.
#[derive(Debug, Default)]
pub struct Environment {
    outer: Option<Rc<RefCell<Environment>>>,
    store: HashMap<String, Object>,
}

impl Environment {
    /// Creates a new, top-level (global) environment.
    pub fn new() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            outer: None,
            store: HashMap::new(),
        }))
    }

    /// Creates a new environment enclosed within an outer one. Used once
    /// per function invocation to hold the parameter bindings.
    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer),
            store: HashMap::new(),
        }))
    }

    /// Looks up a name, walking outward through the chain on a local miss.
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => match &self.outer {
                Some(outer) => outer.borrow().get(name),
                None => None,
            },
        }
    }

    /// Binds a name in the *current* scope only. A name already bound in an
    /// enclosing scope is shadowed locally, never overwritten.
    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }

    fn add_identifiers(&self, mut identifiers: HashSet<String>) -> HashSet<String> {
        for identifier in self.store.keys() {
            identifiers.insert(identifier.clone());
        }
        match &self.outer {
            Some(outer) => outer.borrow().add_identifiers(identifiers),
            None => identifiers,
        }
    }

    /// Every name visible from this scope, for REPL completion.
    pub fn get_identifiers(&self) -> HashSet<String> {
        self.add_identifiers(HashSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_global() {
        let env = Environment::new();
        env.borrow_mut().set("x", Object::Integer(10));

        assert_eq!(env.borrow().get("x"), Some(Object::Integer(10)));
    }

    #[test]
    fn test_get_unbound_global() {
        let env = Environment::new();
        assert_eq!(env.borrow().get("y"), None);
    }

    #[test]
    fn test_get_from_enclosed() {
        let global = Environment::new();
        global.borrow_mut().set("x", Object::Integer(10));

        let local = Environment::new_enclosed(global);
        local.borrow_mut().set("y", Object::Integer(20));

        assert_eq!(local.borrow().get("y"), Some(Object::Integer(20)));
        assert_eq!(local.borrow().get("x"), Some(Object::Integer(10)));
        assert_eq!(local.borrow().get("z"), None);
    }

    #[test]
    fn test_shadowing_does_not_touch_outer() {
        let global = Environment::new();
        global.borrow_mut().set("x", Object::Integer(10));

        let local = Environment::new_enclosed(global.clone());
        local.borrow_mut().set("x", Object::Integer(50));

        assert_eq!(local.borrow().get("x"), Some(Object::Integer(50)));
        // The outer binding is shadowed, not replaced.
        assert_eq!(global.borrow().get("x"), Some(Object::Integer(10)));
    }

    #[test]
    fn test_get_identifiers_walks_the_chain() {
        let global = Environment::new();
        global.borrow_mut().set("a", Object::Integer(1));
        let local = Environment::new_enclosed(global);
        local.borrow_mut().set("b", Object::Integer(2));

        let identifiers = local.borrow().get_identifiers();
        assert!(identifiers.contains("a"));
        assert!(identifiers.contains("b"));
        assert_eq!(identifiers.len(), 2);
    }
}
