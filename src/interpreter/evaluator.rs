use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;
use log::{debug, trace};
use thiserror::Error;
use crate::interpreter::ast::{Expr, Stmt};
use crate::interpreter::environment::{Environment, LookupError, ScopeId};
use crate::interpreter::lexer::{Token, TokenType};
use crate::interpreter::native;
use crate::interpreter::value::{Callable, Function, Value};


const MAX_CALL_DEPTH: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Error)]
#[error("{} {}", .token.start(), .message)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError { token: token.clone(), message: message.into() }
    }
}

type RuntimeResult<T> = Result<T, RuntimeError>;

/// How a statement finished executing.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    environment: Environment,
    globals: ScopeId,
    scope: ScopeId,

    out: Box<dyn Write>,
    input: Box<dyn BufRead>,

    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_io(io::stdout(), BufReader::new(io::stdin()))
    }

    /// Creates an interpreter that prints to `out` and reads from `input`.
    pub fn with_io(out: impl Write + 'static, input: impl BufRead + 'static) -> Interpreter {
        let mut environment = Environment::new();
        native::register(&mut environment, ScopeId::GLOBAL);

        Interpreter {
            environment,
            globals: ScopeId::GLOBAL,
            scope: ScopeId::GLOBAL,

            out: Box::new(out),
            input: Box::new(input),

            call_depth: 0,
        }
    }

    /// Executes a batch of statements. The first runtime error aborts the rest of the batch;
    /// definitions made before it stay in place.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        debug!("Executing {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Return(_)) => {
                    debug!("Top-level return, skipping the rest of the batch");
                    break;
                },
                Ok(_) => {},
                Err(err) => {
                    self.recover();
                    return Err(err);
                },
            }
        }

        Ok(())
    }

    /// Evaluates a single expression and renders its value.
    pub fn interpret_expression(&mut self, expr: &Expr) -> RuntimeResult<String> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value.to_string()),
            Err(err) => {
                self.recover();
                Err(err)
            },
        }
    }

    fn recover(&mut self) {
        self.scope = self.globals;
        self.call_depth = 0;
    }

    // Statements

    fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Block(statements) => {
                let scope = self.environment.push(self.scope);
                self.execute_block(statements, scope)
            },
            Stmt::Break(_) => Ok(Flow::Break),
            Stmt::Continue(_) => Ok(Flow::Continue),
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            },
            Stmt::For { condition, increment, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {},
                    }

                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }

                Ok(Flow::Normal)
            },
            Stmt::Function(declaration) => {
                self.environment.capture(self.scope);

                let function = Callable::Function(Function {
                    declaration: Rc::clone(declaration),
                    closure: self.scope,
                });

                self.define(&declaration.name, Some(Value::Callable(Rc::new(function))))?;
                Ok(Flow::Normal)
            },
            Stmt::If { condition, then, otherwise } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then)
                } else if let Some(otherwise) = otherwise {
                    self.execute(otherwise)
                } else {
                    Ok(Flow::Normal)
                }
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            },
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => Some(self.evaluate(initializer)?),
                    None => None,
                };

                self.define(name, value)?;
                Ok(Flow::Normal)
            },
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {},
                    }
                }

                Ok(Flow::Normal)
            },
        }
    }

    /// Runs `statements` with `scope` as the current scope, then restores the previous one.
    fn execute_block(&mut self, statements: &[Stmt], scope: ScopeId) -> RuntimeResult<Flow> {
        let previous = std::mem::replace(&mut self.scope, scope);
        let result = self.execute_statements(statements);

        self.scope = previous;
        self.environment.release(scope);
        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {},
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    fn define(&mut self, name: &Token, value: Option<Value>) -> RuntimeResult<()> {
        if self.environment.define(self.scope, name.source(), value) {
            Ok(())
        } else {
            Err(RuntimeError::new(name, format!("Variable '{}' is already defined in this scope.", name.source())))
        }
    }

    // Expressions

    fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;

                if self.environment.assign(self.scope, name.source(), value.clone()) {
                    Ok(value)
                } else {
                    Err(Self::undefined_variable(name))
                }
            },
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                Self::evaluate_binary(left, operator, right)
            },
            Expr::Call { callee, paren, args } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(args.len());

                for arg in args {
                    values.push(self.evaluate(arg)?);
                }

                self.call(&callee, paren, values)
            },
            Expr::Grouping(expr) => self.evaluate(expr),
            Expr::Literal(value) => Ok(Value::from(value)),
            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type() == TokenType::ShortcircuitOr {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            },
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator.token_type() {
                    TokenType::Not => Ok(Value::Boolean(!right.is_truthy())),
                    TokenType::Minus => Ok(Value::Number(-Self::number_operand(operator, &right)?)),
                    TokenType::Plus => Ok(Value::Number(Self::number_operand(operator, &right)?)),
                    _ => Err(RuntimeError::new(operator, "Unknown unary operator.")),
                }
            },
            Expr::Variable(name) => match self.environment.get(self.scope, name.source()) {
                Ok(value) => Ok(value),
                Err(LookupError::Undefined) => Err(Self::undefined_variable(name)),
                Err(LookupError::Uninitialized) => Err(RuntimeError::new(name,
                    format!("Variable '{}' must be initialized before use.", name.source()))),
            },
        }
    }

    fn evaluate_binary(left: Value, operator: &Token, right: Value) -> RuntimeResult<Value> {
        Ok(match operator.token_type() {
            TokenType::Plus => match (&left, &right) {
                (Value::Number(left), Value::Number(right)) => Value::Number(left + right),
                (Value::String(left), Value::String(right)) => {
                    let mut result = String::with_capacity(left.len() + right.len());
                    result.push_str(left);
                    result.push_str(right);

                    Value::String(Rc::from(result))
                },
                _ => return Err(RuntimeError::new(operator, "Operands must be two numbers or two strings.")),
            },
            TokenType::Minus => Self::arithmetic(operator, &left, &right, |left, right| left - right)?,
            TokenType::Multiply => Self::arithmetic(operator, &left, &right, |left, right| left * right)?,
            TokenType::Divide => Self::arithmetic(operator, &left, &right, |left, right| left / right)?,
            TokenType::Percent => Self::arithmetic(operator, &left, &right, |left, right| left % right)?,

            TokenType::Greater => Self::comparison(operator, &left, &right, |left, right| left > right)?,
            TokenType::GreaterEqual => Self::comparison(operator, &left, &right, |left, right| left >= right)?,
            TokenType::Less => Self::comparison(operator, &left, &right, |left, right| left < right)?,
            TokenType::LessEqual => Self::comparison(operator, &left, &right, |left, right| left <= right)?,

            TokenType::Equal => Value::Boolean(left == right),
            TokenType::NotEqual => Value::Boolean(left != right),

            TokenType::And => Self::bitwise(operator, &left, &right, |left, right| left & right)?,
            TokenType::Or => Self::bitwise(operator, &left, &right, |left, right| left | right)?,
            TokenType::Xor => Self::bitwise(operator, &left, &right, |left, right| left ^ right)?,

            _ => return Err(RuntimeError::new(operator, "Unknown binary operator.")),
        })
    }

    fn arithmetic(operator: &Token, left: &Value, right: &Value, op: impl Fn(f64, f64) -> f64) -> RuntimeResult<Value> {
        let (left, right) = Self::number_operands(operator, left, right)?;
        Ok(Value::Number(op(left, right)))
    }

    fn comparison(operator: &Token, left: &Value, right: &Value, op: impl Fn(f64, f64) -> bool) -> RuntimeResult<Value> {
        let (left, right) = Self::number_operands(operator, left, right)?;
        Ok(Value::Boolean(op(left, right)))
    }

    fn bitwise(operator: &Token, left: &Value, right: &Value, op: impl Fn(i32, i32) -> i32) -> RuntimeResult<Value> {
        let (left, right) = Self::number_operands(operator, left, right)?;

        if left.fract() != 0.0 || right.fract() != 0.0 {
            return Err(RuntimeError::new(operator, "Operands must be integer numbers."));
        }

        // Wraps like a 32-bit integer
        Ok(Value::Number(op(left as i64 as i32, right as i64 as i32) as f64))
    }

    fn number_operand(operator: &Token, operand: &Value) -> RuntimeResult<f64> {
        match operand {
            Value::Number(value) => Ok(*value),
            _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
        }
    }

    fn number_operands(operator: &Token, left: &Value, right: &Value) -> RuntimeResult<(f64, f64)> {
        match (left, right) {
            (Value::Number(left), Value::Number(right)) => Ok((*left, *right)),
            _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
        }
    }

    fn undefined_variable(name: &Token) -> RuntimeError {
        RuntimeError::new(name, format!("Undefined variable '{}'.", name.source()))
    }

    // Calls

    fn call(&mut self, callee: &Value, paren: &Token, args: Vec<Value>) -> RuntimeResult<Value> {
        let callable = match callee {
            Value::Callable(callable) => Rc::clone(callable),
            _ => return Err(RuntimeError::new(paren, "Can only call functions.")),
        };

        let arity = callable.arity();

        if !arity.accepts(args.len()) {
            return Err(RuntimeError::new(paren, format!("Expected {} arguments but got {}.", arity, args.len())));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(paren, "Stack overflow."));
        }

        trace!("Calling {} with {} argument(s) at depth {}", callable, args.len(), self.call_depth);

        self.call_depth += 1;
        let result = match callable.as_ref() {
            Callable::Function(function) => self.call_function(function, args),
            Callable::Native(native) => (native.function)(self, paren, args),
        };
        self.call_depth -= 1;

        result
    }

    fn call_function(&mut self, function: &Function, args: Vec<Value>) -> RuntimeResult<Value> {
        let scope = self.environment.push(function.closure);

        for (param, arg) in function.declaration.params.iter().zip(args) {
            if !self.environment.define(scope, param.source(), Some(arg)) {
                self.environment.release(scope);
                return Err(RuntimeError::new(param, format!("Variable '{}' is already defined in this scope.", param.source())));
            }
        }

        match self.execute_block(&function.declaration.body, scope)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }

    /// The sink `print` and `println` write to.
    pub fn output(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    // Input and output for the native library

    pub(crate) fn write_output(&mut self, token: &Token, text: &str) -> RuntimeResult<()> {
        self.out.write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|err| RuntimeError::new(token, format!("Could not write output: {}", err)))
    }

    pub(crate) fn flush_output(&mut self, token: &Token) -> RuntimeResult<()> {
        self.out.flush().map_err(|err| RuntimeError::new(token, format!("Could not write output: {}", err)))
    }

    /// Reads one line without its terminator, or `None` at the end of the input.
    pub(crate) fn read_line(&mut self, token: &Token) -> RuntimeResult<Option<String>> {
        let mut line = String::new();

        match self.input.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => {
                let len = line.trim_end_matches(&['\r', '\n'][..]).len();
                line.truncate(len);

                Ok(Some(line))
            },
            Err(err) => Err(RuntimeError::new(token, format!("Could not read input: {}", err))),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}
