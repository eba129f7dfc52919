use std::rc::Rc;
use crate::interpreter::lexer::{Literal, Token};

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<Literal> for LiteralValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Number(value) => LiteralValue::Number(value),
            Literal::String(value) => LiteralValue::String(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        // The closing parenthesis, for error positions
        paren: Token,
        args: Vec<Expr>,
    },
    Grouping(Box<Expr>),
    Literal(LiteralValue),
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Variable(Token),
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Break(Token),
    Continue(Token),
    Expression(Expr),
    /// Loop produced by desugaring `for`; the initializer lives in the enclosing block.
    For {
        condition: Expr,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    Function(Rc<FunctionDecl>),
    If {
        condition: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        initializer: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}
