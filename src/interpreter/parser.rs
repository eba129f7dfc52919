use std::rc::Rc;
use log::debug;
use thiserror::Error;
use crate::interpreter::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::interpreter::lexer::{Token, TokenPos, TokenType};

#[cfg(test)]
mod tests;

const MAX_ARGUMENTS: usize = 255;

#[derive(Clone, Debug, PartialEq, Error)]
#[error("{pos} Error{location}: {message}")]
pub struct ParseError {
    pub pos: TokenPos,
    /// ` at 'lexeme'`, or ` at end` for the end of the input
    pub location: String,
    pub message: String,
}

impl ParseError {
    fn at(token: &Token, message: &str) -> ParseError {
        let location = if token.token_type() == TokenType::Eof {
            String::from(" at end")
        } else {
            format!(" at '{}'", token.source())
        };

        ParseError { pos: *token.start(), location, message: message.to_owned() }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Result of parsing a single line in an interactive session.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    Statements(Vec<Stmt>),
    Expression(Expr),
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,

    loop_depth: usize,
    allow_expression: bool,
    found_expression: bool,

    errors: Vec<ParseError>,
}

impl Parser {
    /// `tokens` must end with an `Eof` token, as produced by the lexer.
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        if tokens.last().map(|token| token.token_type()) != Some(TokenType::Eof) {
            let pos = tokens.last().map(|token| *token.start()).unwrap_or_else(TokenPos::begin);
            tokens.push(Token::new(TokenType::Eof, String::new(), None, pos));
        }

        Parser {
            tokens,
            current: 0,
            loop_depth: 0,
            allow_expression: false, found_expression: false,
            errors: Vec::new(),
        }
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // Declaration parsing

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        statements
    }

    /// Like [`Parser::parse`], but a lone expression without a trailing `;` is returned as is.
    pub fn parse_interactive(&mut self) -> Parsed {
        let mut statements = Vec::new();
        self.allow_expression = true;

        while !self.is_eof() {
            let stmt = self.parse_declaration();
            self.allow_expression = false;

            match stmt {
                Some(Stmt::Expression(expr)) if self.found_expression => return Parsed::Expression(expr),
                Some(stmt) => statements.push(stmt),
                None => {},
            }
        }

        Parsed::Statements(statements)
    }

    fn parse_declaration(&mut self) -> Option<Stmt> {
        let bare_expression = std::mem::take(&mut self.allow_expression);

        let result = if self.matches(TokenType::Func) {
            self.parse_function_declaration()
        } else if self.matches(TokenType::Let) {
            self.parse_var_declaration()
        } else {
            self.parse_statement(bare_expression)
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(_) => {
                self.synchronize();
                None
            },
        }
    }

    fn parse_function_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenType::Identifier, "Expected function name.")?;
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after function name.")?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::ParenthesisRight) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Can't have more than 255 parameters.");
                }

                let param = self.expect(TokenType::Identifier, "Expected parameter name.")?;

                if params.iter().any(|other| other.source() == param.source()) {
                    self.error("Duplicate parameter name.");
                }

                params.push(param);

                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenType::ParenthesisRight, "Expected ')' after parameters.")?;
        self.expect(TokenType::BracketLeft, "Expected '{' before function body.")?;

        // Loops around the declaration don't extend into the body
        let enclosing_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block();
        self.loop_depth = enclosing_loop_depth;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body: body? })))
    }

    fn parse_var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.expect(TokenType::Identifier, "Expected a variable name.")?;

        let initializer = if self.matches(TokenType::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    // Statement parsing

    fn parse_statement(&mut self, bare_expression: bool) -> ParseResult<Stmt> {
        if self.matches(TokenType::Return) {
            self.parse_return_statement()
        } else if self.matches(TokenType::For) {
            self.parse_for_statement()
        } else if self.matches(TokenType::While) {
            self.parse_while_statement()
        } else if self.matches(TokenType::Break) || self.matches(TokenType::Continue) {
            self.parse_loop_control_statement()
        } else if self.matches(TokenType::If) {
            self.parse_if_statement()
        } else if self.matches(TokenType::BracketLeft) {
            Ok(Stmt::Block(self.parse_block()?))
        } else {
            self.parse_expression_statement(bare_expression)
        }
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        let value = if !self.check(TokenType::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn parse_loop_control_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();

        if self.loop_depth == 0 {
            self.error(&format!("Must be inside a loop to use '{}'.", keyword.source()));
        }

        self.expect(TokenType::Semicolon, &format!("Expected ';' after '{}'.", keyword.source()))?;

        Ok(if keyword.token_type() == TokenType::Break {
            Stmt::Break(keyword)
        } else {
            Stmt::Continue(keyword)
        })
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'for'.")?;

        let initializer = if self.matches(TokenType::Semicolon) {
            None
        } else if self.matches(TokenType::Let) {
            Some(self.parse_var_declaration()?)
        } else {
            Some(self.parse_expression_statement(false)?)
        };

        let condition = if !self.check(TokenType::Semicolon) {
            self.parse_expression()?
        } else {
            Expr::Literal(LiteralValue::Boolean(true))
        };
        self.expect(TokenType::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if !self.check(TokenType::ParenthesisRight) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenType::ParenthesisRight, "Expected ')' after for clauses.")?;

        let body = Box::new(self.parse_loop_body()?);

        let mut statements = Vec::new();
        statements.extend(initializer);
        statements.push(Stmt::For { condition, increment, body });

        Ok(Stmt::Block(statements))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::ParenthesisRight, "Expected ')' after condition.")?;

        let body = Box::new(self.parse_loop_body()?);
        Ok(Stmt::While { condition, body })
    }

    fn parse_loop_body(&mut self) -> ParseResult<Stmt> {
        self.loop_depth += 1;
        let body = self.parse_statement(false);
        self.loop_depth -= 1;

        body
    }

    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenType::ParenthesisRight, "Expected ')' after if condition.")?;

        let then = Box::new(self.parse_statement(false)?);

        let otherwise = if self.matches(TokenType::Else) {
            Some(Box::new(self.parse_statement(false)?))
        } else {
            None
        };

        Ok(Stmt::If { condition, then, otherwise })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenType::BracketRight) && !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        self.expect(TokenType::BracketRight, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn parse_expression_statement(&mut self, bare_expression: bool) -> ParseResult<Stmt> {
        let expr = self.parse_expression()?;

        if bare_expression && self.is_eof() {
            self.found_expression = true;
        } else {
            self.expect(TokenType::Semicolon, "Expected ';' after expression.")?;
        }

        Ok(Stmt::Expression(expr))
    }

    // Expression parsing

    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;

        if self.matches(TokenType::Assign) {
            let value = self.parse_assignment()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign { name, value: Box::new(value) }),
                expr => {
                    // Reported, but the expression itself is still usable
                    self.error("Invalid assignment target.");
                    Ok(expr)
                },
            };
        }

        Ok(expr)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;

        while self.matches(TokenType::ShortcircuitOr) {
            let operator = self.previous().clone();
            let right = self.parse_and()?;

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_bitwise_or()?;

        while self.matches(TokenType::ShortcircuitAnd) {
            let operator = self.previous().clone();
            let right = self.parse_bitwise_or()?;

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_bitwise_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Or], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Xor], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::And], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Equal, TokenType::NotEqual], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Less, TokenType::LessEqual, TokenType::Greater, TokenType::GreaterEqual],
                          Self::parse_term)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Plus, TokenType::Minus], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        self.parse_binary(&[TokenType::Multiply, TokenType::Divide, TokenType::Percent], Self::parse_unary)
    }

    /// Left-associative binary operators of one precedence level.
    fn parse_binary(&mut self, operators: &[TokenType], operand: fn(&mut Self) -> ParseResult<Expr>) -> ParseResult<Expr> {
        let mut expr = operand(self)?;

        while self.matches_any(operators) {
            let operator = self.previous().clone();
            let right = operand(self)?;

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[TokenType::Not, TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous().clone();
            let right = self.parse_unary()?;

            return Ok(Expr::Unary { operator, right: Box::new(right) });
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        while self.matches(TokenType::ParenthesisLeft) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = vec![];

        if !self.check(TokenType::ParenthesisRight) {
            args.push(self.parse_expression()?);

            while self.matches(TokenType::Comma) {
                if args.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Can't have more than 255 arguments.");
                }

                args.push(self.parse_expression()?);
            }
        }

        let paren = self.expect(TokenType::ParenthesisRight, "Expected ')' after arguments.")?;
        Ok(Expr::Call { callee: Box::new(callee), paren, args })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::False) {
            return Ok(Expr::Literal(LiteralValue::Boolean(false)));
        } else if self.matches(TokenType::True) {
            return Ok(Expr::Literal(LiteralValue::Boolean(true)));
        } else if self.matches(TokenType::Nil) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        } else if self.matches_any(&[TokenType::Number, TokenType::String]) {
            let literal = self.previous().literal().cloned();

            return match literal {
                Some(literal) => Ok(Expr::Literal(literal.into())),
                None => Err(self.error("Literal token without a value.")),
            };
        } else if self.matches(TokenType::Identifier) {
            return Ok(Expr::Variable(self.previous().clone()));
        } else if self.matches(TokenType::ParenthesisLeft) {
            let expr = self.parse_expression()?;
            self.expect(TokenType::ParenthesisRight, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        } else if self.matches_any(&[TokenType::Class, TokenType::This, TokenType::Super]) {
            let message = format!("'{}' is reserved.", self.previous().source());
            return Err(self.error(&message));
        }

        Err(self.error_at_current("Expected expression."))
    }

    // Token handling

    fn consume(&mut self) -> &Token {
        if !self.is_eof() {
            self.current += 1;
        }

        self.previous()
    }

    fn expect(&mut self, token_type: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(token_type) {
            return Ok(self.consume().clone());
        }

        Err(self.error_at_current(message))
    }

    fn matches(&mut self, token_type: TokenType) -> bool { // Should be called "match", but that's a keyword
        if !self.check(token_type) {
            return false;
        }

        self.consume();
        true
    }

    fn matches_any(&mut self, token_types: &[TokenType]) -> bool {
        token_types.iter().any(|token_type| self.matches(*token_type))
    }

    #[inline]
    fn check(&self, token_type: TokenType) -> bool {
        !self.is_eof() && self.peek().token_type() == token_type
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_eof(&self) -> bool {
        self.peek().token_type() == TokenType::Eof
    }

    // Error handling

    fn synchronize(&mut self) {
        self.consume();

        while !self.is_eof() {
            if self.previous().token_type() == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type() {
                TokenType::Class | TokenType::Func | TokenType::Let | TokenType::For
                | TokenType::If | TokenType::While | TokenType::Return => return,
                _ => {},
            };

            self.consume();
        }
    }

    fn error_at_current(&mut self, message: &str) -> ParseError {
        let token = self.peek().clone();
        self.error_at(&token, message)
    }

    fn error(&mut self, message: &str) -> ParseError {
        let token = self.previous().clone();
        self.error_at(&token, message)
    }

    fn error_at(&mut self, token: &Token, message: &str) -> ParseError {
        let error = ParseError::at(token, message);
        debug!("{}", error);

        self.errors.push(error.clone());
        error
    }
}
