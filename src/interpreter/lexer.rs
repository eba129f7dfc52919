use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::Chars;
use lazy_static::lazy_static;
use log::debug;
use thiserror::Error;
use crate::util;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPos {
    pub line: i32,
    pub column: i32,
}

impl TokenPos {
    pub fn new(line: i32, column: i32) -> TokenPos {
        TokenPos { line, column }
    }

    pub fn begin() -> TokenPos {
        TokenPos::new(1, 1)
    }
}

impl Display for TokenPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[line {} column {}]", self.line, self.column)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    ParenthesisLeft, ParenthesisRight,
    BracketLeft, BracketRight,
    Comma, Dot, Semicolon,

    Minus, Plus, Multiply, Divide, Percent,

    Not, NotEqual,
    Assign, Equal,
    Greater, GreaterEqual,
    Less, LessEqual,

    And, ShortcircuitAnd,
    Or, ShortcircuitOr,
    Xor,

    Identifier,
    String, Number,

    // Keywords
    Class, Else, False, For, Func, If, Nil, Return,
    Super, This, True, Let, While, Break, Continue,

    // EOF
    Eof,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenType> = HashMap::from([
        ("class", TokenType::Class),
        ("else", TokenType::Else),
        ("false", TokenType::False),
        ("for", TokenType::For),
        ("func", TokenType::Func),
        ("if", TokenType::If),
        ("nil", TokenType::Nil),
        ("return", TokenType::Return),
        ("super", TokenType::Super),
        ("this", TokenType::This),
        ("true", TokenType::True),
        ("let", TokenType::Let),
        ("while", TokenType::While),
        ("break", TokenType::Break),
        ("continue", TokenType::Continue),
    ]);
}

/// The parsed value carried by number and string tokens.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    token_type: TokenType,
    source: String,
    literal: Option<Literal>,
    start: TokenPos,
}

impl Token {
    pub fn new(token_type: TokenType, source: String, literal: Option<Literal>, start: TokenPos) -> Token {
        Token {
            token_type, source,
            literal, start,
        }
    }

    pub fn token_type(&self) -> TokenType { self.token_type }
    pub fn source(&self) -> &str { &self.source }
    pub fn literal(&self) -> Option<&Literal> { self.literal.as_ref() }
    pub fn start(&self) -> &TokenPos { &self.start }
    pub fn line(&self) -> i32 { self.start.line }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.token_type {
            TokenType::Eof => f.write_str("Eof"),
            TokenType::String => write!(f, "`\"{}\"`", self.source),
            _ => write!(f, "`{}`", self.source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
    #[error("{0} Error: Unexpected character '{1}'")]
    UnexpectedCharacter(TokenPos, char),
    #[error("{pos} Error: Unterminated string")]
    UnterminatedString {
        pos: TokenPos,
    },
    #[error("{pos} Error: Invalid number literal '{lexeme}'")]
    InvalidNumber {
        pos: TokenPos,
        lexeme: String,
    },
}

impl LexerError {
    pub fn pos(&self) -> TokenPos {
        match self {
            LexerError::UnexpectedCharacter(pos, _) => *pos,
            LexerError::UnterminatedString { pos } => *pos,
            LexerError::InvalidNumber { pos, .. } => *pos,
        }
    }
}

type LexerResult<T> = Result<T, LexerError>;

pub struct Lexer<'source> {
    input: &'source str,

    chars: Chars<'source>,
    peek_1: Option<char>,
    peek_2: Option<char>,

    start_index: usize,
    current_index: usize,

    start_pos: TokenPos,
    current_pos: TokenPos,

    errors: Vec<LexerError>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Lexer<'source> {
        Lexer {
            input: source,

            chars: source.chars(),
            peek_1: None,
            peek_2: None,

            start_index: 0,
            current_index: 0,

            start_pos: TokenPos::begin(),
            current_pos: TokenPos::begin(),

            errors: Vec::new(),
        }
    }

    /// Scans the whole input. Errors do not stop scanning; they are collected and can be
    /// inspected with [`Lexer::errors`] afterwards. The result always ends with one `Eof` token.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            match self.scan_token() {
                Ok(token) => {
                    let eof = token.token_type() == TokenType::Eof;
                    tokens.push(token);

                    if eof {
                        break;
                    }
                },
                Err(err) => {
                    debug!("{}", err);
                    self.errors.push(err);
                },
            }
        }

        tokens
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexerError> {
        self.errors
    }

    pub fn scan_token(&mut self) -> LexerResult<Token> {
        loop {
            self.skip_whitespace();
            self.start_index = self.current_index;
            self.start_pos = self.current_pos;

            let c = match self.consume() {
                Some(c) => c,
                None => return Ok(self.make_token(TokenType::Eof)),
            };

            return match c {
                '(' => Ok(self.make_token(TokenType::ParenthesisLeft)),
                ')' => Ok(self.make_token(TokenType::ParenthesisRight)),
                '{' => Ok(self.make_token(TokenType::BracketLeft)),
                '}' => Ok(self.make_token(TokenType::BracketRight)),
                ',' => Ok(self.make_token(TokenType::Comma)),
                '.' => Ok(self.make_token(TokenType::Dot)),
                ';' => Ok(self.make_token(TokenType::Semicolon)),
                '-' => Ok(self.make_token(TokenType::Minus)),
                '+' => Ok(self.make_token(TokenType::Plus)),
                '*' => Ok(self.make_token(TokenType::Multiply)),
                '%' => Ok(self.make_token(TokenType::Percent)),
                '^' => Ok(self.make_token(TokenType::Xor)),

                '=' => Ok(if self.expect('=') { self.make_token(TokenType::Equal) } else {
                    self.make_token(TokenType::Assign)
                }),
                '!' => Ok(if self.expect('=') { self.make_token(TokenType::NotEqual) } else {
                    self.make_token(TokenType::Not)
                }),
                '>' => Ok(if self.expect('=') { self.make_token(TokenType::GreaterEqual) } else {
                    self.make_token(TokenType::Greater)
                }),
                '<' => Ok(if self.expect('=') { self.make_token(TokenType::LessEqual) } else {
                    self.make_token(TokenType::Less)
                }),
                '&' => Ok(if self.expect('&') { self.make_token(TokenType::ShortcircuitAnd) } else {
                    self.make_token(TokenType::And)
                }),
                '|' => Ok(if self.expect('|') { self.make_token(TokenType::ShortcircuitOr) } else {
                    self.make_token(TokenType::Or)
                }),

                '/' => if self.expect('/') {
                    // Skip line comments
                    self.skip_line();
                    continue;
                } else {
                    Ok(self.make_token(TokenType::Divide))
                },

                '"' => self.scan_string(),
                c if util::is_numeric(c) => self.scan_number(),
                c if util::is_alphabetic(c) => Ok(self.scan_identifier()),

                _ => Err(LexerError::UnexpectedCharacter(self.start_pos, c)),
            };
        }
    }

    fn scan_string(&mut self) -> LexerResult<Token> {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }

            self.consume();
        }

        if self.is_eof() {
            Err(LexerError::UnterminatedString { pos: self.start_pos })
        } else {
            self.consume(); // the trailing '"'

            // Don't add leading and trailing '"' characters to the literal value
            let value = self.input[(self.start_index + 1)..(self.current_index - 1)].to_owned();
            Ok(self.make_literal_token(TokenType::String, Literal::String(value)))
        }
    }

    fn scan_number(&mut self) -> LexerResult<Token> {
        while let Some('0'..='9') = self.peek() {
            self.consume();
        }

        if let Some('.') = self.peek() {
            if let Some('0'..='9') = self.peek_next() {
                self.consume();

                while let Some('0'..='9') = self.peek() {
                    self.consume();
                }
            }
        }

        let source = &self.input[self.start_index..self.current_index];

        match source.parse::<f64>() {
            Ok(value) => Ok(self.make_literal_token(TokenType::Number, Literal::Number(value))),
            Err(_) => Err(LexerError::InvalidNumber { pos: self.start_pos, lexeme: source.to_owned() }),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if !util::is_alphanumeric(c) {
                break;
            }

            self.consume();
        }

        let name = &self.input[self.start_index..self.current_index];
        let token_type = KEYWORDS.get(name).copied().unwrap_or(TokenType::Identifier);

        self.make_token(token_type)
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token {
            token_type,
            source: self.input[self.start_index..self.current_index].to_owned(),
            literal: None,
            start: self.start_pos,
        }
    }

    fn make_literal_token(&self, token_type: TokenType, literal: Literal) -> Token {
        Token {
            literal: Some(literal),
            ..self.make_token(token_type)
        }
    }

    fn consume(&mut self) -> Option<char> {
        let c = if let Some(c) = self.peek_1.take() {
            self.peek_1 = self.peek_2.take();
            Some(c)
        } else {
            self.chars.next()
        }?;

        self.current_index += c.len_utf8();

        if c == '\n' {
            self.current_pos.line += 1;
            self.current_pos.column = 1;
        } else {
            self.current_pos.column += 1;
        }

        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        if self.peek_1.is_none() {
            self.peek_1 = self.chars.next();
        }

        self.peek_1
    }

    fn peek_next(&mut self) -> Option<char> {
        self.peek()?;

        if self.peek_2.is_none() {
            self.peek_2 = self.chars.next();
        }

        self.peek_2
    }

    fn expect(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                return;
            }

            self.consume();
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                return;
            }

            self.consume();
        }
    }

    fn is_eof(&self) -> bool {
        self.current_index >= self.input.len()
    }
}
