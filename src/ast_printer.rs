use crate::ast::{Expr, LiteralValue, Stmt};

/// Renders syntax trees in a parenthesized prefix form, e.g.
/// `(+ 1.0 (group (* 2.0 3.0)))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_program(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, self.print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let inner: Vec<String> = statements.iter().map(|s| self.print_stmt(s)).collect();
                format!("(block {})", inner.join(" "))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(eb)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", self.print(condition), self.print_stmt(body))
            }

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                let body: Vec<String> = decl.body.iter().map(|s| self.print_stmt(s)).collect();
                format!(
                    "(fun {}({}) {})",
                    decl.name.lexeme,
                    params.join(" "),
                    body.join(" ")
                )
            }

            Stmt::Return { value, .. } => match value {
                Some(v) => format!("(return {})", self.print(v)),
                None => "(return)".to_string(),
            },

            Stmt::Class(class) => {
                let mut out: String = format!("(class {}", class.name.lexeme);

                if let Some(superclass) = &class.superclass {
                    out.push_str(&format!(" < {}", self.print(superclass)));
                }

                for method in &class.methods {
                    out.push_str(&format!(" {}", method.name.lexeme));
                }

                for method in &class.statics {
                    out.push_str(&format!(" static {}", method.name.lexeme));
                }

                out.push(')');
                out
            }
        }
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::Literal(value) => match value {
                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
                LiteralValue::Str(s) => s.to_string(),
                LiteralValue::Bool(b) => b.to_string(),
                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Variable { name, .. } => name.lexeme.to_string(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(|a| self.print(a)).collect();
                if args.is_empty() {
                    format!("(call {})", self.print(callee))
                } else {
                    format!("(call {} {})", self.print(callee), args.join(" "))
                }
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}
