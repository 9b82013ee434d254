//! Heap objects of the runtime: closures, native functions, classes and
//! instances, plus the [`Callable`] contract they share.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Completion, Interpreter};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Anything that can appear on the left of `(...)`.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function declaration closed over the frame it was defined in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Same declaration, wrapped in a frame that binds `this` to `instance`.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let environment = Environment::shared_child(&self.closure);
        environment.borrow_mut().define("this", instance);

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// The bound receiver of an initializer; its closure frame holds `this`.
    fn receiver(&self) -> Result<Value> {
        let this = Token::new(TokenType::THIS, "this", self.declaration.name.line);
        self.closure.borrow().get_at(0, &this)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment = Environment::shared_child(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let completion = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return self.receiver();
        }

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host functions
// ─────────────────────────────────────────────────────────────────────────────

pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value>;

/// A function implemented in Rust and registered as a global.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: usize, func: NativeFn) -> Self {
        Self { name, arity, func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({}/{})", self.name, self.arity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fields
// ─────────────────────────────────────────────────────────────────────────────

/// Name → value storage shared by instances and by classes (for statics).
#[derive(Default)]
pub struct FieldTable {
    fields: RefCell<HashMap<String, Value>>,
}

impl FieldTable {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
    statics: FieldTable,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
        statics: Vec<Rc<LoxFunction>>,
    ) -> Self {
        let table = FieldTable::default();

        for function in statics {
            let member: String = function.name().to_string();
            table.set(&member, Value::Function(function));
        }

        Self {
            name,
            superclass,
            methods,
            statics: table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unbound method lookup through this class and its ancestors.
    pub fn find_declared_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self
                .superclass
                .as_ref()
                .and_then(|superclass| superclass.find_declared_method(name)),
        }
    }

    /// Method lookup on behalf of `instance`.  The instance's own fields win
    /// at every level of the chain, `super.x` included; otherwise the first
    /// declared method found is bound to the instance.
    pub fn find_method(&self, instance: &Rc<LoxInstance>, name: &str) -> Option<Value> {
        if let Some(field) = instance.fields.get(name) {
            return Some(field);
        }

        if let Some(method) = self.methods.get(name) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Some(Value::Function(Rc::new(bound)));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(instance, name))
    }

    /// Static member lookup: this class first, then its ancestors.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.statics.get(&name.lexeme) {
            return Ok(value);
        }

        match &self.superclass {
            Some(superclass) => superclass.get(name),
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.statics.set(&name.lexeme, value);
    }
}

impl Callable for Rc<LoxClass> {
    fn arity(&self) -> usize {
        self.find_declared_method("init")
            .map_or(0, |init| init.arity())
    }

    /// Construction: a fresh instance, initialised by `init` if there is one.
    /// The result is always the instance itself.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Constructing instance of '{}'", self.name);

        let instance = Rc::new(LoxInstance::new(Rc::clone(self)));

        if let Some(init) = self.find_declared_method("init") {
            init.bind(Value::Instance(Rc::clone(&instance)))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|s| s.name.as_str()),
            )
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: FieldTable,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: FieldTable::default(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property read: own fields shadow methods.
    pub fn get(instance: &Rc<LoxInstance>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.fields.get(&name.lexeme) {
            return Ok(value);
        }

        instance
            .class
            .find_method(instance, &name.lexeme)
            .ok_or_else(|| {
                LoxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
            })
    }

    pub fn set(&self, name: &Token, value: Value) {
        self.fields.set(&name.lexeme, value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoxInstance({})", self.class.name)
    }
}
