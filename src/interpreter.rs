//! Tree‑walking evaluator.
//!
//! Statements run for their effects and report how they completed
//! ([`Completion`]); expressions produce [`Value`]s.  Variable access uses the
//! binding distances recorded by the [`Resolver`](crate::resolver::Resolver)
//! through [`Interpreter::note_local`]; a node with no recorded distance is a
//! global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::{Local, Timelike};
use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, LiteralValue, Stmt};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::object::{Callable, LoxClass, LoxFunction, LoxInstance, NativeFunction};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest nesting of Lox calls before execution stops with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 8192;

/// How a statement finished.  `Return` travels up through blocks and loops
/// until the enclosing call consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    call_depth: usize,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` statements and `printNative` calls write
    /// to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            output,
        };

        interpreter.define_native(NativeFunction::new("clock", 0, clock));
        interpreter.define_native(NativeFunction::new("printNative", 1, print_native));

        interpreter
    }

    fn define_native(&mut self, native: NativeFunction) {
        debug!("Defining native function '{}'", native.name());

        self.globals
            .borrow_mut()
            .define(native.name(), Value::NativeFunction(Rc::new(native)));
    }

    /// Record that the node `id` refers to a binding `depth` frames out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops execution and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                // The resolver rejects top-level `return`, so this is unreachable
                // for resolved programs.
                debug!("Ignoring top-level return of {}", value);
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.write_line(&value)?;
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment = Environment::shared_child(&self.environment);
                return self.execute_block(statements, environment);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_stmt) = else_branch {
                    return self.execute(else_stmt);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                return Ok(Completion::Return(value));
            }

            Stmt::Class(class) => self.execute_class(class)?,
        }

        Ok(Completion::Normal)
    }

    /// Run `statements` inside `environment`, restoring the current frame
    /// afterwards whether they finish, return, or fail.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Completion> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(Completion::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Completion::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(&mut self, class: &ClassDecl) -> Result<()> {
        debug!("Defining class '{}'", class.name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match &class.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(superclass) => Some(superclass),
                _ => {
                    let at: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => &class.name,
                    };

                    return Err(LoxError::runtime(at, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Methods may refer to the class by name before it exists.
        self.environment
            .borrow_mut()
            .define(&class.name.lexeme, Value::Nil);

        let enclosing: Option<Rc<RefCell<Environment>>> = match &superclass {
            Some(superclass) => {
                let previous = Rc::clone(&self.environment);
                self.environment = Environment::shared_child(&previous);
                self.environment
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(superclass)));
                Some(previous)
            }
            None => None,
        };

        let methods: HashMap<String, Rc<LoxFunction>> = class
            .methods
            .iter()
            .map(|decl| {
                let is_initializer: bool = decl.name.lexeme == "init";
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), is_initializer);
                (decl.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let statics: Vec<Rc<LoxFunction>> = class
            .statics
            .iter()
            .map(|decl| {
                Rc::new(LoxFunction::new(
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    false,
                ))
            })
            .collect();

        let lox_class = LoxClass::new(class.name.lexeme.clone(), superclass, methods, statics);

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(&class.name, Value::Class(Rc::new(lox_class)))?;

        info!("Class '{}' defined", class.name.lexeme);

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(LoxError::runtime(
                            operator,
                            format!(
                                "Operand of '-' must be a number; got {}.",
                                other.type_name()
                            ),
                        )),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuits = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(distance, name, value.clone())?;
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                Value::Class(class) => class.get(name),
                other => Err(LoxError::runtime(
                    name,
                    format!("Only instances have properties; got {}.", other.type_name()),
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.set(name, value.clone());
                    Ok(value)
                }
                Value::Class(class) => {
                    let value = self.evaluate(value)?;
                    class.set(name, value.clone());
                    Ok(value)
                }
                other => Err(LoxError::runtime(
                    name,
                    format!("Only instances have fields; got {}.", other.type_name()),
                )),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super.method`: find `method` starting at the superclass, bound to the
    /// current `this`, which lives one frame inside the `super` frame.
    fn evaluate_super(&self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) if distance > 0 => distance,
            _ => return Err(LoxError::runtime(keyword, "Can't use 'super' here.")),
        };

        let superclass = self.environment.borrow().get_at(distance, keyword)?;
        let this = Token::synthetic(TokenType::THIS, "this", keyword.line);
        let object = self.environment.borrow().get_at(distance - 1, &this)?;

        match (superclass, object) {
            (Value::Class(superclass), Value::Instance(instance)) => superclass
                .find_method(&instance, &method.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        method,
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                }),
            _ => Err(LoxError::runtime(keyword, "Can't use 'super' here.")),
        }
    }

    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let callable: &dyn Callable = match callee {
            Value::Function(function) => function.as_ref(),
            Value::NativeFunction(native) => native.as_ref(),
            Value::Class(class) => class,
            other => {
                return Err(LoxError::runtime(
                    paren,
                    format!(
                        "Can only call functions and classes; got {}.",
                        other.type_name()
                    ),
                ))
            }
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }

    /// Write `value` and a newline to the output sink.
    pub fn write_line(&mut self, value: &Value) -> Result<()> {
        writeln!(self.output, "{}", value)?;
        self.output.flush()?;

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match operator.token_type {
        TokenType::PLUS => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (left, right) => Err(LoxError::runtime(
                operator,
                format!(
                    "Operands of '+' must be two numbers or two strings; got {} and {}.",
                    left.type_name(),
                    right.type_name()
                ),
            )),
        },

        TokenType::MINUS => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a - b)),

        TokenType::STAR => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a * b)),

        // IEEE semantics: x / 0 is ±inf or NaN, not an error.
        TokenType::SLASH => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a / b)),

        TokenType::GREATER => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a > b)),

        TokenType::GREATER_EQUAL => {
            numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a >= b))
        }

        TokenType::LESS => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a < b)),

        TokenType::LESS_EQUAL => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a <= b)),

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}

fn numbers(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(
            operator,
            format!(
                "Operands of '{}' must be numbers; got {} and {}.",
                operator.lexeme,
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// Fraction of the current wall‑clock second, in `[0, 1)`.
fn clock(_interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    // Leap seconds report up to 1999 ms.
    let millis: u32 = Local::now().nanosecond() / 1_000_000 % 1000;

    Ok(Value::Number(f64::from(millis) / 1000.0))
}

fn print_native(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value> {
    let value: Value = arguments.first().cloned().unwrap_or(Value::Nil);

    interpreter.write_line(&value)?;

    Ok(Value::Nil)
}
