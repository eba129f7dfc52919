use crate::interpreter::lexer::Lexer;
use super::*;

fn parse(source: &str) -> (Vec<Stmt>, Vec<ParseError>) {
    let mut parser = Parser::new(Lexer::new(source).scan_tokens());
    let statements = parser.parse();

    (statements, parser.into_errors())
}

fn messages(source: &str) -> Vec<String> {
    parse(source).1.into_iter().map(|error| error.message).collect()
}

mod precedence {
    use super::*;

    fn expression(source: &str) -> Expr {
        match parse(source) {
            (mut statements, errors) if errors.is_empty() && statements.len() == 1 => match statements.remove(0) {
                Stmt::Expression(expr) => expr,
                stmt => panic!("expected an expression statement, got {:?}", stmt),
            },
            (statements, errors) => panic!("unexpected parse result: {:?} {:?}", statements, errors),
        }
    }

    fn operator_of(expr: &Expr) -> &str {
        match expr {
            Expr::Binary { operator, .. } | Expr::Logical { operator, .. } | Expr::Unary { operator, .. } => operator.source(),
            _ => panic!("expected an operator, got {:?}", expr),
        }
    }

    #[test]
    pub fn test_factor_binds_tighter_than_term() {
        match expression("2 + 3 * 4;") {
            Expr::Binary { left, operator, right } => {
                assert_eq!(*left, Expr::Literal(LiteralValue::Number(2.0)));
                assert_eq!(operator.token_type(), TokenType::Plus);
                assert_eq!(operator_of(&right), "*");
            },
            expr => panic!("expected a binary expression, got {:?}", expr),
        }
    }

    #[test]
    pub fn test_binary_operators_are_left_associative() {
        match expression("10 - 4 - 3;") {
            Expr::Binary { left, right, .. } => {
                assert_eq!(operator_of(&left), "-");
                assert_eq!(*right, Expr::Literal(LiteralValue::Number(3.0)));
            },
            expr => panic!("expected a binary expression, got {:?}", expr),
        }
    }

    #[test]
    pub fn test_assignment_is_right_associative() {
        match expression("a = b = 1;") {
            Expr::Assign { name, value } => {
                assert_eq!(name.source(), "a");
                assert!(matches!(*value, Expr::Assign { .. }));
            },
            expr => panic!("expected an assignment, got {:?}", expr),
        }
    }

    #[test]
    pub fn test_bitwise_levels() {
        // | < ^ < & < ==
        let expr = expression("a | b ^ c & d == e;");
        assert_eq!(operator_of(&expr), "|");

        match expr {
            Expr::Binary { right, .. } => match *right {
                Expr::Binary { ref right, .. } => {
                    assert_eq!(operator_of(&right), "&");
                },
                ref expr => panic!("expected '^', got {:?}", expr),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    pub fn test_logical_operators() {
        let expr = expression("a || b && c;");
        assert_eq!(operator_of(&expr), "||");

        match expr {
            Expr::Logical { right, .. } => assert_eq!(operator_of(&right), "&&"),
            _ => unreachable!(),
        }
    }

    #[test]
    pub fn test_unary_and_calls() {
        match expression("-f(1)(2, 3);") {
            Expr::Unary { operator, right } => {
                assert_eq!(operator.token_type(), TokenType::Minus);

                match *right {
                    Expr::Call { callee, args, .. } => {
                        assert_eq!(args.len(), 2);
                        assert!(matches!(*callee, Expr::Call { .. }));
                    },
                    expr => panic!("expected a call, got {:?}", expr),
                }
            },
            expr => panic!("expected a unary expression, got {:?}", expr),
        }
    }
}

mod statements {
    use super::*;

    #[test]
    pub fn test_for_is_desugared() {
        let (statements, errors) = parse("for (let i = 0; i < 3; i = i + 1) print(i);");
        assert!(errors.is_empty());

        match &statements[..] {
            [Stmt::Block(inner)] => {
                assert!(matches!(inner[0], Stmt::Var { .. }));
                assert!(matches!(inner[1], Stmt::For { increment: Some(_), .. }));
            },
            _ => panic!("unexpected statements: {:?}", statements),
        }
    }

    #[test]
    pub fn test_empty_for_clauses() {
        let (statements, errors) = parse("for (;;) break;");
        assert!(errors.is_empty());

        match &statements[..] {
            [Stmt::Block(inner)] => match &inner[..] {
                [Stmt::For { condition, increment: None, body }] => {
                    assert_eq!(*condition, Expr::Literal(LiteralValue::Boolean(true)));
                    assert!(matches!(**body, Stmt::Break(_)));
                },
                _ => panic!("unexpected loop: {:?}", inner),
            },
            _ => panic!("unexpected statements: {:?}", statements),
        }
    }

    #[test]
    pub fn test_function_declaration() {
        let (statements, errors) = parse("func add(a, b) { return a + b; }");
        assert!(errors.is_empty());

        match &statements[..] {
            [Stmt::Function(function)] => {
                assert_eq!(function.name.source(), "add");
                assert_eq!(function.params.iter().map(Token::source).collect::<Vec<_>>(), vec!["a", "b"]);
                assert!(matches!(function.body[..], [Stmt::Return { value: Some(_), .. }]));
            },
            _ => panic!("unexpected statements: {:?}", statements),
        }
    }

    #[test]
    pub fn test_dangling_else_binds_to_nearest_if() {
        let (statements, errors) = parse("if (a) if (b) x; else y;");
        assert!(errors.is_empty());

        match &statements[..] {
            [Stmt::If { then, otherwise: None, .. }] => assert!(matches!(**then, Stmt::If { otherwise: Some(_), .. })),
            _ => panic!("unexpected statements: {:?}", statements),
        }
    }

    #[test]
    pub fn test_interactive_bare_expression() {
        let mut parser = Parser::new(Lexer::new("1 + 2").scan_tokens());

        assert!(matches!(parser.parse_interactive(), Parsed::Expression(Expr::Binary { .. })));
        assert!(!parser.had_error());
    }

    #[test]
    pub fn test_interactive_statements() {
        let mut parser = Parser::new(Lexer::new("let a = 1; a;").scan_tokens());

        match parser.parse_interactive() {
            Parsed::Statements(statements) => assert_eq!(statements.len(), 2),
            parsed => panic!("expected statements, got {:?}", parsed),
        }
    }

    #[test]
    pub fn test_interactive_expression_must_come_first() {
        let mut parser = Parser::new(Lexer::new("let a = 1; a").scan_tokens());
        parser.parse_interactive();

        assert_eq!(parser.errors().len(), 1);
        assert_eq!(parser.errors()[0].message, "Expected ';' after expression.");
    }

    #[test]
    pub fn test_missing_eof_is_added() {
        let mut tokens = Lexer::new("x;").scan_tokens();
        tokens.pop();

        let mut parser = Parser::new(tokens);
        assert_eq!(parser.parse().len(), 1);
        assert!(!parser.had_error());
    }
}

mod errors {
    use super::*;

    #[test]
    pub fn test_recovery_reports_every_statement() {
        let (statements, errors) = parse("let = 1;\nprint(2);\nlet b = ;\nprint(3);");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Expected a variable name.");
        assert_eq!(errors[1].message, "Expected expression.");
        assert_eq!(errors[1].pos.line, 3);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    pub fn test_recovery_after_missing_semicolons() {
        let (statements, errors) = parse("print(1)\nlet x = 1;\nx = 2\nprint(3);");

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|error| error.message == "Expected ';' after expression."));
        assert_eq!((errors[0].pos.line, errors[0].location.as_str()), (2, " at 'let'"));
        assert_eq!((errors[1].pos.line, errors[1].location.as_str()), (4, " at 'print'"));
        assert!(statements.is_empty());
    }

    #[test]
    pub fn test_error_location() {
        let (_, errors) = parse("1 + 2");
        assert_eq!(errors[0].to_string(), "[line 1 column 6] Error at end: Expected ';' after expression.");

        let (_, errors) = parse("let 5;");
        assert_eq!(errors[0].to_string(), "[line 1 column 5] Error at '5': Expected a variable name.");
    }

    #[test]
    pub fn test_break_outside_loop() {
        assert_eq!(messages("break;"), vec!["Must be inside a loop to use 'break'."]);
        assert_eq!(messages("if (true) continue;"), vec!["Must be inside a loop to use 'continue'."]);
        assert!(messages("while (true) { if (x) break; continue; }").is_empty());
    }

    #[test]
    pub fn test_function_body_is_not_inside_loop() {
        assert_eq!(messages("while (true) { func f() { break; } }"), vec!["Must be inside a loop to use 'break'."]);
        assert!(messages("while (true) { func f() { } break; }").is_empty());
    }

    #[test]
    pub fn test_invalid_assignment_target() {
        let (statements, errors) = parse("a + b = c; d;");

        assert_eq!(errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>(), vec!["Invalid assignment target."]);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    pub fn test_reserved_words() {
        assert_eq!(messages("this;"), vec!["'this' is reserved."]);
        assert_eq!(messages("x = super;"), vec!["'super' is reserved."]);
    }

    #[test]
    pub fn test_duplicate_parameter() {
        let (statements, errors) = parse("func f(a, a) { }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Duplicate parameter name.");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    pub fn test_unclosed_block() {
        assert_eq!(messages("{ let a = 1;"), vec!["Expected '}' after block."]);
    }

    #[test]
    pub fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        assert_eq!(messages(&format!("f({});", args)), vec!["Can't have more than 255 arguments."]);
        assert!(messages(&format!("f({});", vec!["1"; 255].join(", "))).is_empty());
    }
}
