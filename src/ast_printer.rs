use crate::ast::Expr;
use crate::token::TokenType;

/// Converts an expression to the Crafting-Interpreters prefix form
/// (no heap allocations except `String` joins for output).
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(token) => match &token.token_type {
                TokenType::TRUE => "true".into(),

                TokenType::FALSE => "false".into(),

                TokenType::NIL => "nil".into(),

                TokenType::STRING(s) => s.clone(),

                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                _ => unreachable!("Invalid literal"),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { op, right } => {
                format!("({} {})", op.lexeme, Self::print(right))
            }

            Expr::Binary { left, op, right } | Expr::Logical { left, op, right } => format!(
                "({} {} {})",
                op.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── references ─────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ───────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s: String = format!("(call {}", Self::print(callee));

                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }

                s.push(')');
                s
            }

            Expr::Lambda(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();

                format!("(fun ({}))", params.join(" "))
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}
