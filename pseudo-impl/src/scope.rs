//! Lexical scopes.
//!
//! A [`Scope`] is a shared handle to one frame of bindings plus its parent. Blocks
//! and calls create child scopes; closures keep the scope they were declared in.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    AlreadyDeclared,
    Constant,
    NotFound,
}

struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Binding>,
    parent: Option<Scope>,
}

#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

// Closures point back at their scope, so only binding names are shown.
impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(frame) => f.debug_set().entries(frame.bindings.keys()).finish(),
            Err(_) => f.write_str("{..}"),
        }
    }
}

impl Scope {
    pub fn root() -> Self {
        Scope::default()
    }

    pub fn child(&self) -> Self {
        Scope(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// `let`/`const`: a second declaration in the same scope is an error.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) -> Result<(), ScopeError> {
        let mut frame = self.0.borrow_mut();
        if frame.bindings.contains_key(name) {
            return Err(ScopeError::AlreadyDeclared);
        }
        frame
            .bindings
            .insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    /// Function declarations, parameters and `var`: redeclaring replaces.
    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().bindings.insert(
            name.to_string(),
            Binding {
                value,
                mutable: true,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.0.borrow();
        match frame.bindings.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => frame.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    /// Update the nearest binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), ScopeError> {
        let mut frame = self.0.borrow_mut();
        match frame.bindings.get_mut(name) {
            Some(binding) if binding.mutable => {
                binding.value = value;
                Ok(())
            }
            Some(_) => Err(ScopeError::Constant),
            None => match &frame.parent {
                Some(parent) => parent.assign(name, value),
                None => Err(ScopeError::NotFound),
            },
        }
    }

    /// Drop every binding, breaking reference cycles between closures and
    /// the scopes that hold them.
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut self.0.borrow_mut().bindings);
        drop(bindings);
    }
}
