pub mod ast;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod native;
pub mod parser;
pub mod printer;
pub mod value;
