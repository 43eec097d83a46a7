use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// One node in the scope chain.  Closures and blocks share nodes through
/// `Rc<RefCell<..>>`, so a closure can outlive the block that created its
/// enclosing environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in this node, shadowing any enclosing binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look a name up through the chain.  `None` means unbound everywhere.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an existing binding somewhere in the chain.  Returns false
    /// if the name is unbound; assignment never creates bindings.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Read a name directly from the node `distance` hops up the chain.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let target: Rc<RefCell<Environment>> = Self::ancestor(env, distance)?;

        let value: Option<Value> = target.borrow().values.get(name).cloned();

        value
    }

    /// Write a name directly into the node `distance` hops up the chain.
    /// Returns false if the hop count or the name does not resolve.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Self::ancestor(env, distance) {
            Some(target) => {
                target.borrow_mut().values.insert(name.to_string(), value);
                true
            }

            None => false,
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current: Rc<RefCell<Environment>> = env.clone();

        for _ in 0..distance {
            let next: Option<Rc<RefCell<Environment>>> = current.borrow().enclosing.clone();

            current = next?;
        }

        Some(current)
    }
}
