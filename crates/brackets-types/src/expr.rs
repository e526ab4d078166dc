//! Expression AST for statement code and command arguments.
//!
//! Expressions are a JavaScript-flavoured subset: literals, identifiers,
//! member/index access, method calls, unary/binary/logical operators and
//! the conditional operator.

use std::fmt;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    /// Backtick string with `${expr}` interpolation.
    Template(Vec<TemplatePart>),
    Array(Vec<Expr>),
    Identifier(String),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `object.method(args)`
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    /// `==`
    LooseEq,
    /// `!=`
    LooseNotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    And,
    Or,
    /// `??`
    Coalesce,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Less => "<",
            BinOp::LessEq => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEq => ">=",
            BinOp::LooseEq => "==",
            BinOp::LooseNotEq => "!=",
            BinOp::StrictEq => "===",
            BinOp::StrictNotEq => "!==",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Coalesce => "??",
        }
    }
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    fn is_atomic(&self) -> bool {
        !matches!(
            self,
            Expr::Unary { .. } | Expr::Binary { .. } | Expr::Conditional { .. }
        )
    }
}

/// Writes `expr`, parenthesized unless it is atomic.
struct Operand<'a>(&'a Expr);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_atomic() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Null => write!(f, "null"),
            Expr::Undefined => write!(f, "undefined"),
            Expr::Template(parts) => {
                write!(f, "`")?;
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => {
                            write!(f, "{}", s.replace('`', "\\`").replace("${", "\\${"))?
                        }
                        TemplatePart::Expr(e) => write!(f, "${{{e}}}")?,
                    }
                }
                write!(f, "`")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::Identifier(name) => write!(f, "{name}"),
            Expr::Member { object, property } => write!(f, "{}.{property}", Operand(object)),
            Expr::Index { object, index } => write!(f, "{}[{index}]", Operand(object)),
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                write!(f, "{}.{method}(", Operand(object))?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", Operand(operand)),
                UnaryOp::Neg => write!(f, "-{}", Operand(operand)),
                UnaryOp::Plus => write!(f, "+{}", Operand(operand)),
                UnaryOp::TypeOf => write!(f, "typeof {}", Operand(operand)),
            },
            Expr::Binary { left, op, right } => {
                write!(f, "{} {} {}", Operand(left), op.symbol(), Operand(right))
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => write!(
                f,
                "{} ? {} : {}",
                Operand(cond),
                Operand(then),
                Operand(otherwise)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parenthesizes_nested_operators() {
        let expr = Expr::binary(
            Expr::binary(Expr::ident("a"), BinOp::Add, Expr::Number(1.0)),
            BinOp::Mul,
            Expr::Member {
                object: Box::new(Expr::ident("items")),
                property: "length".into(),
            },
        );
        assert_eq!(expr.to_string(), "(a + 1) * items.length");
    }

    #[test]
    fn test_display_strings_are_escaped() {
        let expr = Expr::Str("say \"hi\"".into());
        assert_eq!(expr.to_string(), r#""say \"hi\"""#);
    }
}
