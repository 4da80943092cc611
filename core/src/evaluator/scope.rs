//! Lexical environments.
//!
//! Each block, loop iteration and call gets an `Env` whose parent is the
//! enclosing one. Closures keep their defining `Env` alive through the `Rc`,
//! so they see later updates to captured variables.

use core::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::evaluator::RuntimeError;
use crate::values::Value;

#[derive(Debug)]
struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Debug, Default)]
pub struct Env {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    /// An environment with no parent.
    pub fn root() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn child(parent: &Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Bind `name` in this environment, replacing any existing binding.
    pub fn define(&self, name: impl Into<String>, value: Value, mutable: bool) {
        self.bindings
            .borrow_mut()
            .insert(name.into(), Binding { value, mutable });
    }

    /// Bind `name` for a `let`/`const` declaration. Fails if this block
    /// already declares it.
    pub fn declare(&self, name: &str, value: Value, mutable: bool) -> Result<(), RuntimeError> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(RuntimeError::Syntax(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        bindings.insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    /// Whether `name` is bound in this environment, ignoring parents.
    pub fn has_own(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut env = self;
        loop {
            if let Some(binding) = env.bindings.borrow().get(name) {
                return Some(binding.value.clone());
            }
            env = env.parent.as_deref()?;
        }
    }

    /// Update the nearest binding of `name`.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut env = self;
        loop {
            if let Some(binding) = env.bindings.borrow_mut().get_mut(name) {
                if !binding.mutable {
                    return Err(RuntimeError::type_error("Assignment to constant variable."));
                }
                binding.value = value;
                return Ok(());
            }
            match env.parent.as_deref() {
                Some(parent) => env = parent,
                None => {
                    return Err(RuntimeError::Reference {
                        name: name.to_string(),
                    });
                }
            }
        }
    }

    /// Drop every binding. Closures stored in an environment usually capture
    /// that same environment, so the `Rc` cycle has to be cut by hand.
    pub fn clear(&self) {
        let bindings = core::mem::take(&mut *self.bindings.borrow_mut());
        drop(bindings);
    }
}
