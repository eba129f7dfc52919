use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};
use crate::interpreter::environment::{Environment, ScopeId};
use crate::interpreter::evaluator::{Interpreter, RuntimeError};
use crate::interpreter::lexer::Token;
use crate::interpreter::value::{Arity, Callable, NativeFn, NativeFunction, Value};

const NATIVES: [(&str, Arity, NativeFn); 5] = [
    ("clock", Arity::Fixed(0), clock),
    ("print", Arity::Variadic, print),
    ("println", Arity::Variadic, println),
    ("read", Arity::Fixed(0), read),
    ("exit", Arity::Fixed(0), exit),
];

pub fn register(environment: &mut Environment, scope: ScopeId) {
    for (name, arity, function) in NATIVES {
        let native = Callable::Native(NativeFunction { name, arity, function });
        environment.define(scope, name, Some(Value::Callable(Rc::new(native))));
    }
}

fn clock(_: &mut Interpreter, _: &Token, _: Vec<Value>) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as f64)
        .unwrap_or(0.0);

    Ok(Value::Number(millis))
}

fn join(args: &[Value]) -> String {
    args.iter().map(Value::to_string).collect::<Vec<String>>().join(" ")
}

fn print(interpreter: &mut Interpreter, paren: &Token, args: Vec<Value>) -> Result<Value, RuntimeError> {
    interpreter.write_output(paren, &join(&args))?;
    Ok(Value::Nil)
}

fn println(interpreter: &mut Interpreter, paren: &Token, args: Vec<Value>) -> Result<Value, RuntimeError> {
    let mut line = join(&args);
    line.push('\n');

    interpreter.write_output(paren, &line)?;
    Ok(Value::Nil)
}

fn read(interpreter: &mut Interpreter, paren: &Token, _: Vec<Value>) -> Result<Value, RuntimeError> {
    let line = match interpreter.read_line(paren)? {
        Some(line) => line,
        None => return Ok(Value::Nil),
    };

    Ok(match line.trim().parse::<f64>() {
        Ok(number) => Value::Number(number),
        Err(_) => Value::from(line.as_str()),
    })
}

fn exit(interpreter: &mut Interpreter, paren: &Token, _: Vec<Value>) -> Result<Value, RuntimeError> {
    interpreter.flush_output(paren)?;
    std::process::exit(0)
}
