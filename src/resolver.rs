//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (a stack of maps tracking declared / initialized /
//!    used for every local name).
//! 2. Report static errors (redeclaration, forward‑read in initializer,
//!    misplaced `return`/`this`/`super`, locals that are never read).
//! 3. Tell the interpreter, for *each* variable occurrence, how many frames out
//!    its binding lives, so the interpreter never falls back to dynamic lookup
//!    that would see a later shadowing local.  Names found in no scope are
//!    globals and are left unrecorded.
//!
//! Errors are reported to the [`Reporter`] and resolution carries on.

use crate::ast::{ClassDecl, Expr, ExprId, FunctionDecl, Stmt};
use crate::error::{LoxError, Reporter};
use crate::interpreter::Interpreter;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body are we inside?  Used to validate `this`/`super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
    /// Inside a static method: no receiver, so no `this` or `super`.
    Static,
}

/// Book‑keeping for one local name.
#[derive(Debug)]
struct ScopeVariable {
    token: Token,
    initialized: bool,
    used: bool,
}

impl ScopeVariable {
    fn declared(token: &Token) -> Self {
        Self {
            token: token.clone(),
            initialized: false,
            used: false,
        }
    }

    /// `this` / `super`: defined by the runtime, never reported as unused.
    fn implicit(token: &Token) -> Self {
        Self {
            token: token.clone(),
            initialized: true,
            used: true,
        }
    }
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i, 'r> {
    interpreter: &'i mut Interpreter,
    reporter: &'r mut Reporter,
    scopes: Vec<HashMap<String, ScopeVariable>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'r> Resolver<'i, 'r> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'r mut Reporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Class(class) => self.resolve_class(class),

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible *inside* its own body
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    /// Two‑phase class binding: the name exists before the superclass and the
    /// methods are resolved, so both may refer to it.
    fn resolve_class(&mut self, class: &ClassDecl) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&class.name);

        if let Some(superclass) = &class.superclass {
            if let Expr::Variable { name, .. } = superclass {
                if name.lexeme == class.name.lexeme {
                    self.error(name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);
        }

        self.define(&class.name);

        if let Some(superclass) = &class.superclass {
            self.begin_scope();
            let token: Token = match superclass {
                Expr::Variable { name, .. } => name.clone(),
                _ => class.name.clone(),
            };
            self.insert_implicit("super", &token);
        }

        // Statics close over the `super` frame but never see `this`.
        let class_kind = self.current_class;
        self.current_class = ClassType::Static;
        for method in &class.statics {
            self.resolve_function(method, FunctionType::Function);
        }
        self.current_class = class_kind;

        self.begin_scope();
        self.insert_implicit("this", &class.name);

        for method in &class.methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer
                let uninitialized = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|var| !var.initialized);

                if uninitialized {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS.  Writing is not a use.
                self.resolve_expr(value);
                self.resolve_local(*id, name, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => match self.current_class {
                ClassType::None => {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                }
                ClassType::Static => {
                    self.error(keyword, "Can't use 'this' in a static method.");
                }
                ClassType::Class | ClassType::Subclass => {
                    self.resolve_local(*id, keyword, true);
                }
            },

            Expr::Super { id, keyword, .. } => match self.current_class {
                ClassType::None => {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                }
                ClassType::Class => {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                }
                ClassType::Static => {
                    self.error(keyword, "Can't use 'super' in a static method.");
                }
                ClassType::Subclass => self.resolve_local(*id, keyword, true),
            },
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        debug!("Resolving function '{}' as {:?}", function.name.lexeme, kind);

        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, reporting every local that was never read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<Token> = scope
            .into_values()
            .filter(|var| !var.used)
            .map(|var| var.token)
            .collect();

        unused.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.lexeme.cmp(&b.lexeme)));

        for token in unused {
            self.error(&token, "Local variable is never used.");
        }
    }

    fn insert_implicit(&mut self, name: &str, token: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ScopeVariable::implicit(token));
        }
    }

    fn declare(&mut self, name: &Token) {
        let duplicate = match self.scopes.last_mut() {
            Some(scope) => {
                let duplicate = scope.contains_key(&name.lexeme);
                if !duplicate {
                    scope.insert(name.lexeme.clone(), ScopeVariable::declared(name));
                }
                duplicate
            }
            None => false,
        };

        if duplicate {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(var) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            var.initialized = true;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it as a global
    /// if it is found in no scope.  A read marks the binding as used.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_read: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(var) = scope.get_mut(&name.lexeme) {
                if is_read {
                    var.used = true;
                }

                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.reporter.report(LoxError::resolve(token, message));
    }
}
