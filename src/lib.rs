pub mod util;
pub mod interpreter;
pub mod error;
mod repl;

use std::path::PathBuf;
use clap::Parser as ClapParser;
use log::debug;
use crate::error::{Error, SyntaxError};
use crate::interpreter::ast::Stmt;
use crate::interpreter::evaluator::Interpreter;
use crate::interpreter::lexer::Lexer;
use crate::interpreter::parser::{Parsed, Parser};
use crate::interpreter::printer::AstPrinter;

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Script to run; starts an interactive session if omitted")]
    pub input: Option<PathBuf>,

    #[clap(short, long, help = "Print the syntax tree of every statement before running it")]
    pub debug: bool,
    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

/// One interpreter together with the settings of the current run. Definitions persist
/// between calls, so a session can be fed a whole program or one line at a time.
pub struct Session {
    interpreter: Interpreter,
    printer: Option<AstPrinter>,
}

impl Session {
    pub fn new(config: &Config) -> Session {
        Session::with_interpreter(Interpreter::new(), config.debug)
    }

    pub fn with_interpreter(interpreter: Interpreter, debug: bool) -> Session {
        Session {
            interpreter,
            printer: if debug { Some(AstPrinter::new(String::from("  "))) } else { None },
        }
    }

    pub fn is_debug(&self) -> bool {
        self.printer.is_some()
    }

    /// Runs a complete program. Nothing is evaluated if it contains any syntax error.
    pub fn run_source(&mut self, source: &str) -> Result<(), Error> {
        let statements = parse(source, Parser::parse)?;

        self.print_statements(&statements)?;
        self.interpreter.interpret(&statements)?;
        Ok(())
    }

    /// Runs one line of an interactive session. Returns the rendered value if the line is a
    /// lone expression.
    pub fn run_line(&mut self, line: &str) -> Result<Option<String>, Error> {
        match parse(line, Parser::parse_interactive)? {
            Parsed::Statements(statements) => {
                self.print_statements(&statements)?;
                self.interpreter.interpret(&statements)?;
                Ok(None)
            },
            Parsed::Expression(expr) => {
                if let Some(printer) = &self.printer {
                    writeln!(self.interpreter.output(), "{}", printer.print_expr(&expr))?;
                }

                Ok(Some(self.interpreter.interpret_expression(&expr)?))
            },
        }
    }

    fn print_statements(&mut self, statements: &[Stmt]) -> Result<(), Error> {
        if let Some(printer) = &mut self.printer {
            for stmt in statements {
                writeln!(self.interpreter.output(), "{}", printer.print_stmt(stmt))?;
            }
        }

        Ok(())
    }
}

/// Scans and parses `source`, collecting every lexer and parser error.
fn parse<T>(source: &str, parse: impl FnOnce(&mut Parser) -> T) -> Result<T, Error> {
    let mut lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer.scan_tokens());
    let result = parse(&mut parser);

    let mut errors: Vec<SyntaxError> = lexer.into_errors().into_iter().map(SyntaxError::Lexer)
        .chain(parser.into_errors().into_iter().map(SyntaxError::Parser))
        .collect();

    if errors.is_empty() {
        return Ok(result);
    }

    debug!("Found {} syntax error(s)", errors.len());
    errors.sort_by_key(|err| (err.pos().line, err.pos().column));
    Err(Error::Syntax(errors))
}

pub fn run(config: &Config) -> Result<(), Error> {
    let mut session = Session::new(config);

    match &config.input {
        Some(path) => {
            debug!("Running {}", path.display());

            let source = std::fs::read_to_string(path)
                .map_err(|source| Error::ReadFile { path: path.clone(), source })?;
            session.run_source(&source)
        },
        None => repl::run_repl(&mut session),
    }
}
