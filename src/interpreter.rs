use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{LoxClass, LoxFunction, LoxInstance, NativeFunction, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::ResolutionMap;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Nested Lox calls allowed before a runtime "Stack overflow." error.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Native stack kept free before a call; below it a new segment is allocated.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_CALL: usize = 1024 * 1024;

/// How a statement finished.  Anything but `Normal` unwinds enclosing
/// statements until a loop (`Break`, `Continue`) or a call (`Return`) takes it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: ResolutionMap,
    out: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` writes to `out`, and defines the
    /// built‑ins in its global frame.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        for native in natives() {
            debug!("Defining native function '{}'", native.name);
            globals
                .borrow_mut()
                .define(native.name, Value::NativeFunction(Rc::new(native)));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            call_depth: 0,
        }
    }

    /// Take in the scope distances of a freshly resolved unit.  Ids are
    /// process‑unique, so earlier units' entries stay valid.
    ///
    /// Entries are never evicted: closures created by an earlier unit may
    /// still run, and their bodies look up these ids.  The map grows with
    /// the total source a session has compiled.
    pub fn resolve(&mut self, locals: ResolutionMap) {
        debug!("Merging {} resolved local(s)", locals.len());
        self.locals.extend(locals);
    }

    /// Where `print` writes.
    pub fn output(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    /// Look up a global binding by name.
    pub fn global(&self, name: &str) -> Option<Value> {
        let token = Token::new(TokenType::IDENTIFIER, name, 0);
        self.globals.borrow().get(&token).ok()
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error stops it; effects of earlier statements remain.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.run_statements(statements);
        self.out.flush()?;
        result?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            let flow: Flow = self.execute(stmt)?;

            if flow != Flow::Normal {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    /// Run `statements` with `env` as the current frame, restoring the
    /// previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, env);
        let result = self.run_statements(statements);
        self.environment = previous;
        result
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env: EnvRef = Environment::child(&self.environment);
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }

                    if let Some(incr) = increment {
                        self.evaluate(incr)?;
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                let function =
                    LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                // Visible (as nil) while the superclass and methods are set up.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let line: usize = match expr {
                                Expr::Variable { name: parent, .. } => parent.line,
                                _ => name.line,
                            };
                            return Err(LoxError::runtime(line, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                let method_env: EnvRef = match &superclass {
                    Some(class) => {
                        let env: EnvRef = Environment::child(&self.environment);
                        env.borrow_mut()
                            .define("super", Value::Class(Rc::clone(class)));
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let methods: HashMap<String, Rc<LoxFunction>> = methods
                    .iter()
                    .map(|decl| {
                        let function = LoxFunction::new(
                            Rc::clone(decl),
                            Rc::clone(&method_env),
                            decl.name.lexeme == INITIALIZER,
                        );
                        (decl.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme.clone(), superclass, methods);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Class(Rc::new(class)));
                Ok(Flow::Normal)
            }
        }
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                let decided = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if decided {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                let callable = callee.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren.line, "Can only call functions and classes.")
                })?;

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(paren.line, "Stack overflow."));
                }

                self.call_depth += 1;
                let result: Result<Value> = stacker::maybe_grow(RED_ZONE, STACK_PER_CALL, || {
                    callable.call(self, args, paren)
                });
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => {
                let distance: usize = *self.locals.get(id).ok_or_else(|| {
                    LoxError::runtime(keyword.line, "Can't use 'super' here.")
                })?;

                // `this` lives in the frame just inside the `super` frame.
                let superclass = Environment::get_at(&self.environment, distance, "super", keyword.line)?;
                let this = Environment::get_at(
                    &self.environment,
                    distance.saturating_sub(1),
                    "this",
                    keyword.line,
                )?;

                let (Value::Class(superclass), Value::Instance(instance)) = (superclass, this) else {
                    return Err(LoxError::runtime(keyword.line, "Can't use 'super' here."));
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }
        }
    }

    /// Resolved occurrences read their frame directly; the rest are globals.
    fn look_up(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            // The left operand decides between addition and concatenation.
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Number(_), _) => {
                    Err(LoxError::runtime(op.line, "Operand must be a number."))
                }
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(_), _) => {
                    Err(LoxError::runtime(op.line, "Operands must be strings."))
                }
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = divisible(op, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::PERCENT => {
                let (a, b) = divisible(op, &left_val, &right_val)?;
                Ok(Value::Number(a % b))
            }

            TokenType::GREATER => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = numbers(op, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.")),
        }
    }
}

fn numbers(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
    }
}

fn divisible(op: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    let (a, b) = numbers(op, left, right)?;

    if b == 0.0 {
        return Err(LoxError::runtime(op.line, "Division by zero."));
    }

    Ok((a, b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Built‑ins
// ─────────────────────────────────────────────────────────────────────────────

fn natives() -> [NativeFunction; 2] {
    [
        NativeFunction {
            name: "clock",
            arity: 0,
            func: native_clock,
        },
        NativeFunction {
            name: "print",
            arity: 1,
            func: native_print,
        },
    ]
}

/// Seconds since the Unix epoch.
fn native_clock(_interpreter: &mut Interpreter, _args: &[Value]) -> std::result::Result<Value, String> {
    let seconds: f64 = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    debug!("Native function 'clock' returned: {}", seconds);
    Ok(Value::Number(seconds))
}

fn native_print(interpreter: &mut Interpreter, args: &[Value]) -> std::result::Result<Value, String> {
    let value: &Value = args.first().unwrap_or(&Value::Nil);
    writeln!(interpreter.output(), "{}", value).map_err(|e| format!("Output error: {}", e))?;
    Ok(Value::Nil)
}
