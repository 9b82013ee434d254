//! One interpreter plus one diagnostic reporter: the unit a script run or a
//! REPL session drives, source chunk by source chunk.

use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan;

/// How a call to [`Session::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Lexical, syntax or resolution errors; nothing was executed.
    StaticError,
    /// Execution stopped at a runtime error.
    RuntimeError,
}

impl Outcome {
    /// Conventional process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    reporter: Reporter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// A session whose program output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::with_interpreter(Interpreter::with_output(output))
    }

    fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            reporter: Reporter::new(),
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut Reporter {
        &mut self.reporter
    }

    /// Scan and parse only.
    pub fn parse(&mut self, source: &str) -> Vec<Stmt> {
        let tokens = scan(source, &mut self.reporter);
        Parser::new(&tokens, &mut self.reporter).parse()
    }

    /// Scan, parse, resolve and execute `source`.  Each phase runs only if the
    /// earlier ones reported nothing; at most one runtime error is reported.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running {} byte(s) of source", source.len());

        let statements = self.parse(source);

        if self.reporter.had_error() {
            debug!("Static errors after parsing; not resolving");
            return Outcome::StaticError;
        }

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

        if self.reporter.had_error() {
            debug!("Static errors after resolving; not executing");
            return Outcome::StaticError;
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Outcome::Ok,
            Err(e) => {
                debug!("Runtime error: {}", e);
                self.reporter.runtime_error(e);
                Outcome::RuntimeError
            }
        }
    }
}
