use crate::interpreter::ast::{Expr, LiteralValue, Stmt};

/// Renders syntax trees as fully parenthesized text. Nested statements go on their own
/// lines, indented one level deeper than their parent.
pub struct AstPrinter {
    indentation: String,

    indent_level: usize,
}

impl AstPrinter {
    pub fn new(indentation: String) -> AstPrinter {
        AstPrinter {
            indentation,
            indent_level: 0,
        }
    }

    pub fn print_stmt(&mut self, stmt: &Stmt) -> String {
        let mut out = String::new();
        self.write_stmt(stmt, &mut out);
        out
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        let mut out = String::new();
        Self::write_expr(expr, &mut out);
        out
    }

    fn write_stmt(&mut self, stmt: &Stmt, out: &mut String) {
        match stmt {
            Stmt::Block(statements) => {
                out.push_str("(block");
                self.write_children(statements.iter(), out);
                out.push(')');
            },
            Stmt::Break(_) => out.push_str("(break)"),
            Stmt::Continue(_) => out.push_str("(continue)"),
            Stmt::Expression(expr) => Self::write_parenthesized(";", &[expr], out),
            Stmt::For { condition, increment, body } => {
                out.push_str("(for ");
                Self::write_expr(condition, out);

                if let Some(increment) = increment {
                    out.push(' ');
                    Self::write_expr(increment, out);
                }

                self.write_children(std::iter::once(body.as_ref()), out);
                out.push(')');
            },
            Stmt::Function(function) => {
                out.push_str("(func ");
                out.push_str(function.name.source());
                out.push_str(" (");
                out.push_str(&function.params.iter().map(|param| param.source()).collect::<Vec<&str>>().join(" "));
                out.push(')');

                self.write_children(function.body.iter(), out);
                out.push(')');
            },
            Stmt::If { condition, then, otherwise } => {
                out.push_str(if otherwise.is_some() { "(if-else " } else { "(if " });
                Self::write_expr(condition, out);

                self.write_children(std::iter::once(then.as_ref()).chain(otherwise.as_deref()), out);
                out.push(')');
            },
            Stmt::Return { value: None, .. } => out.push_str("(return)"),
            Stmt::Return { value: Some(value), .. } => Self::write_parenthesized("return", &[value], out),
            Stmt::Var { name, initializer } => {
                out.push_str("(let ");
                out.push_str(name.source());

                if let Some(initializer) = initializer {
                    out.push(' ');
                    Self::write_expr(initializer, out);
                }

                out.push(')');
            },
            Stmt::While { condition, body } => {
                out.push_str("(while ");
                Self::write_expr(condition, out);

                self.write_children(std::iter::once(body.as_ref()), out);
                out.push(')');
            },
        }
    }

    fn write_children<'a>(&mut self, children: impl Iterator<Item = &'a Stmt>, out: &mut String) {
        self.indent_level += 1;
        let indentation = self.indentation.repeat(self.indent_level);

        for child in children {
            out.push('\n');
            out.push_str(&indentation);
            self.write_stmt(child, out);
        }

        self.indent_level -= 1;
    }

    fn write_expr(expr: &Expr, out: &mut String) {
        match expr {
            Expr::Assign { name, value } => {
                out.push_str("(= ");
                out.push_str(name.source());
                out.push(' ');
                Self::write_expr(value, out);
                out.push(')');
            },
            Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } =>
                Self::write_parenthesized(operator.source(), &[left.as_ref(), right.as_ref()], out),
            Expr::Call { callee, args, .. } => {
                let mut parts = vec![callee.as_ref()];
                parts.extend(args.iter());

                Self::write_parenthesized("call", &parts, out)
            },
            Expr::Grouping(expr) => Self::write_parenthesized("group", &[expr.as_ref()], out),
            Expr::Literal(value) => match value {
                LiteralValue::Nil => out.push_str("nil"),
                LiteralValue::Boolean(value) => out.push_str(&value.to_string()),
                LiteralValue::Number(value) => out.push_str(&value.to_string()),
                LiteralValue::String(value) => {
                    out.push('"');
                    out.push_str(value);
                    out.push('"');
                },
            },
            Expr::Unary { operator, right } => Self::write_parenthesized(operator.source(), &[right.as_ref()], out),
            Expr::Variable(name) => out.push_str(name.source()),
        }
    }

    fn write_parenthesized(name: &str, exprs: &[&Expr], out: &mut String) {
        out.push('(');
        out.push_str(name);

        for expr in exprs {
            out.push(' ');
            Self::write_expr(expr, out);
        }

        out.push(')');
    }
}
