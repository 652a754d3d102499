use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures keep frames alive by holding one.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope frame: its own bindings plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Allocate a fresh child frame of `enclosing`.
    pub fn child(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind (or rebind) `name` in this frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here and then outward.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Assign to an existing binding here or outward.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The frame exactly `distance` links out from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = current.borrow().enclosing()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the frame `distance` links out, without searching.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let frame: Option<EnvRef> = Self::ancestor(env, distance);
        let value: Option<Value> = frame.and_then(|frame| {
            let value = frame.borrow().values.get(name).cloned();
            value
        });

        value.ok_or_else(|| {
            LoxError::runtime(
                line,
                format!("Unresolved binding '{}' at distance {}.", name, distance),
            )
        })
    }

    /// Write `name` in the frame `distance` links out, without searching.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| {
            LoxError::runtime(
                name.line,
                format!("Unresolved binding '{}' at distance {}.", name.lexeme, distance),
            )
        })?;

        frame.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name.line, format!("Undefined variable '{}'.", name.lexeme))
}
