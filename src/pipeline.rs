//! Source text in, effects out: scanner → parser → resolver → interpreter.
//!
//! [`compile`] runs the three static stages and hands back either a
//! [`Program`] or every diagnostic they produced.  [`Lox`] is a session that
//! owns one interpreter (and so one global frame) across many runs, which is
//! what the interactive prompt needs.

use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{ResolutionMap, Resolver};
use crate::scanner::Scanner;
use crate::token::Token;

/// Exit status for a static (lex/parse/resolve) failure.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for a runtime failure.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Exit status for a bad command line.
pub const EXIT_USAGE: i32 = 64;

/// A parsed and resolved compilation unit, ready to run.
#[derive(Debug)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub locals: ResolutionMap,
}

/// Result of running one unit of source.
#[derive(Debug)]
pub enum Outcome {
    /// Ran to completion.
    Ok,

    /// At least one lex/parse/resolve diagnostic; nothing was executed.
    StaticError(Vec<LoxError>),

    /// Execution started and raised.  Earlier effects already happened.
    RuntimeError { message: String, line: usize },
}

impl Outcome {
    /// Conventional process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::StaticError(_) => EXIT_STATIC_ERROR,
            Outcome::RuntimeError { .. } => EXIT_RUNTIME_ERROR,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// Lex, parse and resolve `source`.
///
/// Lexical errors do not stop parsing, so a file reports its syntax errors
/// alongside its bad characters; resolution only runs on a clean parse.
pub fn compile(source: &str) -> Result<Program, Vec<LoxError>> {
    info!("Compiling {} bytes of source", source.len());

    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    let statements: Vec<Stmt> = match Parser::new(&tokens).parse() {
        Ok(statements) => statements,
        Err(parse_errors) => {
            errors.extend(parse_errors);
            return Err(errors);
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    let locals: ResolutionMap = Resolver::new().resolve(&statements)?;

    debug!(
        "Compiled {} statement(s), {} resolved local(s)",
        statements.len(),
        locals.len()
    );

    Ok(Program { statements, locals })
}

/// An interpreter session.  Globals defined by one [`Lox::run`] stay visible
/// to the next.
pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Execute an already compiled unit in this session.
    pub fn execute(&mut self, program: Program) -> Outcome {
        self.interpreter.resolve(program.locals);

        match self.interpreter.interpret(&program.statements) {
            Ok(()) => Outcome::Ok,
            Err(e) => {
                debug!("Runtime failure: {}", e);
                Outcome::RuntimeError {
                    message: e.message(),
                    line: e.line().unwrap_or(0),
                }
            }
        }
    }

    /// Compile and execute `source` in this session.
    pub fn run(&mut self, source: &str) -> Outcome {
        match compile(source) {
            Ok(program) => self.execute(program),
            Err(errors) => {
                debug!("Static failure with {} diagnostic(s)", errors.len());
                Outcome::StaticError(errors)
            }
        }
    }
}

/// One‑shot pipeline over a fresh session.
pub fn compile_and_run(source: &str) -> Outcome {
    Lox::new().run(source)
}
