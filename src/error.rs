use std::io;
use std::path::PathBuf;
use rustyline::error::ReadlineError;
use thiserror::Error;
use crate::interpreter::evaluator::RuntimeError;
use crate::interpreter::lexer::{LexerError, TokenPos};
use crate::interpreter::parser::ParseError;

/// An error found before anything is evaluated.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParseError),
}

impl SyntaxError {
    pub fn pos(&self) -> TokenPos {
        match self {
            SyntaxError::Lexer(err) => err.pos(),
            SyntaxError::Parser(err) => err.pos,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Every syntax error of one source, in source order
    #[error("{}", join_lines(.0))]
    Syntax(Vec<SyntaxError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("Could not read '{}': {}", .path.display(), .source)]
    ReadFile {
        path: PathBuf,
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Repl(#[from] ReadlineError),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Runtime(_) => 2,
            _ => 1,
        }
    }
}

fn join_lines(errors: &[SyntaxError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<String>>().join("\n")
}
