use std::collections::HashMap;
use log::trace;
use crate::interpreter::value::Value;

/// Handle to a scope stored in an [`Environment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupError {
    Undefined,
    /// Declared with `let` but never assigned
    Uninitialized,
}

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Option<Value>>,
    parent: Option<ScopeId>,

    // Referenced by a closure, directly or through a nested scope
    captured: bool,
    free: bool,
}

/// All scopes of one interpreter. Scopes refer to their enclosing scope by handle, so closures
/// can hold on to their defining scope without creating reference cycles.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    free: Vec<ScopeId>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment {
            scopes: vec![Scope::default()],
            free: Vec::new(),
        }
    }

    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        let scope = Scope { parent: Some(parent), ..Scope::default() };

        let id = match self.free.pop() {
            Some(id) => {
                self.scopes[id.0] = scope;
                id
            },
            None => {
                self.scopes.push(scope);
                ScopeId(self.scopes.len() - 1)
            },
        };

        trace!("Pushed scope {} (parent {})", id.0, parent.0);
        id
    }

    /// Gives the scope back to the arena unless a closure still refers to it.
    pub fn release(&mut self, id: ScopeId) {
        if id == ScopeId::GLOBAL {
            return;
        }

        let scope = &mut self.scopes[id.0];

        if scope.captured || scope.free {
            return;
        }

        scope.values.clear();
        scope.free = true;
        self.free.push(id);

        trace!("Released scope {}", id.0);
    }

    /// Keeps `id` and every scope enclosing it alive for the rest of the run.
    pub fn capture(&mut self, id: ScopeId) {
        let mut current = Some(id);

        while let Some(id) = current {
            let scope = &mut self.scopes[id.0];

            if scope.captured {
                break;
            }

            scope.captured = true;
            current = scope.parent;
        }
    }

    /// Returns `false` if `name` is already defined in this exact scope.
    pub fn define(&mut self, scope: ScopeId, name: &str, value: Option<Value>) -> bool {
        let values = &mut self.scopes[scope.0].values;

        if values.contains_key(name) {
            return false;
        }

        values.insert(name.to_owned(), value);
        true
    }

    pub fn get(&self, scope: ScopeId, name: &str) -> Result<Value, LookupError> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &self.scopes[id.0];

            if let Some(value) = scope.values.get(name) {
                return value.clone().ok_or(LookupError::Uninitialized);
            }

            current = scope.parent;
        }

        Err(LookupError::Undefined)
    }

    /// Assigns to the nearest scope that defines `name`. Returns `false` if none does.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) -> bool {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &mut self.scopes[id.0];

            if let Some(slot) = scope.values.get_mut(name) {
                *slot = Some(value);
                return true;
            }

            current = scope.parent;
        }

        false
    }

    /// Number of scopes currently in use, including the global scope.
    pub fn live_scopes(&self) -> usize {
        self.scopes.len() - self.free.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let mut env = Environment::new();
        env.define(ScopeId::GLOBAL, "a", Some(Value::from(1.0)));

        let inner = env.push(ScopeId::GLOBAL);
        env.define(inner, "b", Some(Value::from(2.0)));

        assert_eq!(env.get(inner, "a"), Ok(Value::from(1.0)));
        assert_eq!(env.get(inner, "b"), Ok(Value::from(2.0)));
        assert_eq!(env.get(ScopeId::GLOBAL, "b"), Err(LookupError::Undefined));
    }

    #[test]
    fn shadowing_and_assignment() {
        let mut env = Environment::new();
        env.define(ScopeId::GLOBAL, "a", Some(Value::from("outer")));

        let inner = env.push(ScopeId::GLOBAL);
        env.define(inner, "a", Some(Value::from("inner")));
        assert!(env.assign(inner, "a", Value::from("changed")));

        assert_eq!(env.get(inner, "a"), Ok(Value::from("changed")));
        assert_eq!(env.get(ScopeId::GLOBAL, "a"), Ok(Value::from("outer")));
        assert!(!env.assign(inner, "missing", Value::Nil));
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut env = Environment::new();

        assert!(env.define(ScopeId::GLOBAL, "a", None));
        assert!(!env.define(ScopeId::GLOBAL, "a", Some(Value::Nil)));
    }

    #[test]
    fn uninitialized_until_assigned() {
        let mut env = Environment::new();
        env.define(ScopeId::GLOBAL, "a", None);

        assert_eq!(env.get(ScopeId::GLOBAL, "a"), Err(LookupError::Uninitialized));
        assert!(env.assign(ScopeId::GLOBAL, "a", Value::from(3.0)));
        assert_eq!(env.get(ScopeId::GLOBAL, "a"), Ok(Value::from(3.0)));
    }

    #[test]
    fn released_scopes_are_reused() {
        let mut env = Environment::new();

        let first = env.push(ScopeId::GLOBAL);
        env.define(first, "x", Some(Value::Nil));
        env.release(first);
        assert_eq!(env.live_scopes(), 1);

        let second = env.push(ScopeId::GLOBAL);
        assert_eq!(first, second);
        assert_eq!(env.get(second, "x"), Err(LookupError::Undefined));
    }

    #[test]
    fn captured_scopes_survive_release() {
        let mut env = Environment::new();

        let outer = env.push(ScopeId::GLOBAL);
        let inner = env.push(outer);
        env.define(outer, "x", Some(Value::from(1.0)));
        env.capture(inner);

        env.release(inner);
        env.release(outer);

        assert_eq!(env.live_scopes(), 3);
        assert_eq!(env.get(inner, "x"), Ok(Value::from(1.0)));
    }
}
