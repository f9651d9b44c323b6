//! Values flowing through declarative types
//!
//! Raw property values arrive as nodes, host strings or host lists. Normalized
//! values may additionally be mappings (structured tuples) or key/value pairs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::expr::Expr;

/// Input or canonical output of a declarative type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// An expression node
    Node(Expr),
    /// A plain host string
    Text(String),
    /// An ordered list
    List(Vec<Value>),
    /// Canonical field name to value, in insertion order
    Map(IndexMap<String, Value>),
    /// A decomposed `key = value`
    Pair { key: String, value: Expr },
}

impl Value {
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    pub fn as_node(&self) -> Option<&Expr> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// String content of host strings and raw-string nodes
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Node(Expr::RawString { text }) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short kind name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Node(node) => node.kind(),
            Value::Text(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "mapping",
            Value::Pair { .. } => "pair",
        }
    }
}

impl From<Expr> for Value {
    fn from(node: Expr) -> Self {
        Value::Node(node)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Node(node) => write!(f, "{}", node),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Pair { key, value } => write!(f, "{} = {}", key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mapping() {
        let mut map = IndexMap::new();
        map.insert("kind".to_string(), Value::text("HASH"));
        map.insert(
            "columns".to_string(),
            Value::List(vec![Expr::column("id").into(), Expr::column("dt").into()]),
        );
        assert_eq!(Value::Map(map).to_string(), r#"{kind: "HASH", columns: [id, dt]}"#);
    }

    #[test]
    fn test_raw_string_reads_as_str() {
        assert_eq!(Value::Node(Expr::raw("p1")).as_str(), Some("p1"));
        assert_eq!(Value::Node(Expr::column("p1")).as_str(), None);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let value = Value::List(vec![Expr::column("id").into(), Value::text("x")]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
