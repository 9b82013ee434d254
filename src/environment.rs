use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One frame of the runtime scope chain.
///
/// Frames are shared: a closure keeps its defining frame alive, and writes
/// through any alias are visible to all of them.
#[derive(Debug, Default)]
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

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn shared_child(enclosing: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this frame.  Re‑binding overwrites; the resolver has
    /// already rejected duplicate locals, so this only happens for globals.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup through the chain (used for globals).
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Read `name` exactly `distance` frames out, as computed by the resolver.
    pub fn get_at(&self, distance: usize, name: &Token) -> Result<Value> {
        if distance == 0 {
            return self.values.get(&name.lexeme).cloned().ok_or_else(|| {
                LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
            });
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(distance - 1, name),
            None => Err(LoxError::runtime(
                name,
                format!("Unresolvable scope depth for '{}'.", name.lexeme),
            )),
        }
    }

    pub fn assign_at(&mut self, distance: usize, name: &Token, value: Value) -> Result<()> {
        if distance == 0 {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
            None => Err(LoxError::runtime(
                name,
                format!("Unresolvable scope depth for '{}'.", name.lexeme),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn lookup_walks_outward() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::shared_child(&global);
        let value = inner.borrow().get(&ident("a")).unwrap();

        assert_eq!(value, Value::Number(1.0));
    }

    #[test]
    fn assignment_through_child_is_visible_to_parent() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::shared_child(&global);
        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();

        assert_eq!(global.borrow().get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn get_at_skips_shadowing_frames() {
        let global = Rc::new(RefCell::new(Environment::new()));
        global.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::shared_child(&global);
        inner.borrow_mut().define("x", Value::Number(2.0));

        assert_eq!(inner.borrow().get_at(0, &ident("x")).unwrap(), Value::Number(2.0));
        assert_eq!(inner.borrow().get_at(1, &ident("x")).unwrap(), Value::Number(1.0));

        inner
            .borrow_mut()
            .assign_at(1, &ident("x"), Value::Number(3.0))
            .unwrap();
        assert_eq!(global.borrow().get_at(0, &ident("x")).unwrap(), Value::Number(3.0));
    }

    #[test]
    fn global_redefinition_overwrites() {
        let mut global = Environment::new();
        global.define("a", Value::Number(1.0));
        global.define("a", Value::Number(2.0));

        assert_eq!(global.get(&ident("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let global = Environment::new();
        let err = global.get(&ident("missing")).unwrap_err();

        assert!(err.to_string().contains("Undefined variable 'missing'."));
    }
}
