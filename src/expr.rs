//! Expression node model
//!
//! Closed tagged-union tree for already-parsed property values. Every node owns
//! its children outright, so a tree can never turn into a graph: a transform
//! that needs the same child under two parents clones it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in function names. Anything else is an anonymous (dialect) call.
const KNOWN_FUNCTIONS: &[&str] = &[
    "ABS",
    "CAST",
    "COALESCE",
    "CONCAT",
    "DATE",
    "DATE_FORMAT",
    "DATE_TRUNC",
    "FLOOR",
    "FROM_UNIXTIME",
    "IF",
    "IFNULL",
    "LOWER",
    "MOD",
    "ROUND",
    "STR2DATE",
    "SUBSTR",
    "SUBSTRING",
    "TIME_SLICE",
    "TO_DATE",
    "TRIM",
    "UPPER",
];

/// A scalar literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    /// Numeric literal, source text kept verbatim (`10`, `-2.5`)
    Number(String),
    Boolean(bool),
}

impl Literal {
    pub fn string(text: impl Into<String>) -> Self {
        Literal::String(text.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Literal::Number(text.into())
    }

    /// Text of the literal without quoting (`'HASH'` -> `HASH`)
    pub fn text(&self) -> String {
        match self {
            Literal::String(s) | Literal::Number(s) => s.clone(),
            Literal::Boolean(b) => b.to_string().to_uppercase(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Number(n) => n.parse().ok(),
            Literal::String(s) => s.trim().parse().ok(),
            Literal::Boolean(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// A function call node, known or anonymous
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Whether the name is in the built-in function registry
    pub fn is_known(&self) -> bool {
        KNOWN_FUNCTIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(&self.name))
    }

    pub fn is_anonymous(&self) -> bool {
        !self.is_known()
    }

    /// Upper-cased name, used for dispatch on dialect functions like `HASH`
    pub fn upper_name(&self) -> String {
        self.name.to_ascii_uppercase()
    }
}

/// One node of a parsed property value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Identifier { name: String },
    Literal { literal: Literal },
    Column { name: String },
    Function { call: FunctionCall },
    Tuple { items: Vec<Expr> },
    Equality { key: Box<Expr>, value: Box<Expr> },
    RawString { text: String },
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier { name: name.into() }
    }

    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column { name: name.into() }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::Literal {
            literal: Literal::string(text),
        }
    }

    pub fn number(text: impl Into<String>) -> Self {
        Expr::Literal {
            literal: Literal::number(text),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Literal {
            literal: Literal::Boolean(value),
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            call: FunctionCall::new(name, args),
        }
    }

    pub fn tuple(items: Vec<Expr>) -> Self {
        Expr::Tuple { items }
    }

    pub fn equality(key: Expr, value: Expr) -> Self {
        Expr::Equality {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Expr::RawString { text: text.into() }
    }

    /// Short kind name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Identifier { .. } => "identifier",
            Expr::Literal { .. } => "literal",
            Expr::Column { .. } => "column",
            Expr::Function { .. } => "function",
            Expr::Tuple { .. } => "tuple",
            Expr::Equality { .. } => "equality",
            Expr::RawString { .. } => "raw_string",
        }
    }

    /// Bare name of identifier-like nodes
    pub fn name(&self) -> Option<&str> {
        match self {
            Expr::Identifier { name } | Expr::Column { name } => Some(name),
            Expr::Function { call } => Some(&call.name),
            _ => None,
        }
    }

    /// Plain text carried by scalar nodes: names, literal text, raw strings
    pub fn text(&self) -> Option<String> {
        match self {
            Expr::Identifier { name } | Expr::Column { name } => Some(name.clone()),
            Expr::Literal { literal } => Some(literal.text()),
            Expr::RawString { text } => Some(text.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier { name } | Expr::Column { name } => write!(f, "{}", name),
            Expr::Literal { literal } => write!(f, "{}", literal),
            Expr::Function { call } => {
                write!(f, "{}(", call.name)?;
                write_joined(f, &call.args)?;
                write!(f, ")")
            }
            Expr::Tuple { items } => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Expr::Equality { key, value } => write!(f, "{} = {}", key, value),
            Expr::RawString { text } => write!(f, "{}", text),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_anonymous_functions() {
        let trunc = FunctionCall::new("date_trunc", vec![Expr::string("day"), Expr::column("dt")]);
        assert!(trunc.is_known());

        let range = FunctionCall::new("RANGE", vec![Expr::column("dt")]);
        assert!(range.is_anonymous());
    }

    #[test]
    fn test_display() {
        let node = Expr::tuple(vec![
            Expr::equality(Expr::column("kind"), Expr::string("HASH")),
            Expr::equality(
                Expr::column("columns"),
                Expr::tuple(vec![Expr::column("id"), Expr::column("dt")]),
            ),
            Expr::equality(Expr::column("buckets"), Expr::number("10")),
        ]);
        assert_eq!(node.to_string(), "(kind = 'HASH', columns = (id, dt), buckets = 10)");
    }

    #[test]
    fn test_clone_is_deep() {
        let column = Expr::column("dt");
        let low = Expr::equality(column.clone(), Expr::number("1"));
        let mut high = Expr::equality(column, Expr::number("2"));
        if let Expr::Equality { key, .. } = &mut high {
            **key = Expr::column("other");
        }
        assert_eq!(low.to_string(), "dt = 1");
        assert_eq!(high.to_string(), "other = 2");
    }

    #[test]
    fn test_literal_text() {
        assert_eq!(Literal::string("HASH").text(), "HASH");
        assert_eq!(Literal::number("10").as_i64(), Some(10));
        assert_eq!(Literal::Boolean(true).to_string(), "TRUE");
    }
}
