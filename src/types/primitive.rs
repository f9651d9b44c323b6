//! Primitive declarative types
//!
//! Each primitive owns one narrow acceptance rule. Strings are accepted
//! wherever a node is, by reading them with the fragment reader first; a string
//! that does not read is simply not a match.

use crate::error::{PropertyError, Result};
use crate::expr::{Expr, Literal};
use crate::fragment::{parse_fragment, parse_identifier};
use crate::value::Value;

use super::{DeclarativeType, Repr, Validated};

/// Read host strings into nodes, pass nodes through
fn as_node(value: &Value) -> Option<Expr> {
    match value {
        Value::Node(Expr::RawString { text }) | Value::Text(text) => parse_fragment(text).ok(),
        Value::Node(node) => Some(node.clone()),
        _ => None,
    }
}

// =============================================================================
// StringType
// =============================================================================

/// Plain strings: host strings, raw-string nodes and string literals
#[derive(Debug, Clone, Default)]
pub struct StringType {
    repr: Repr,
}

impl StringType {
    pub fn new() -> Self {
        Self { repr: Repr::Str }
    }

    /// Normalize into `repr` instead of a plain string
    pub fn normalized_as(repr: Repr) -> Self {
        Self { repr }
    }
}

impl DeclarativeType for StringType {
    fn type_name(&self) -> String {
        "StringType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        let text = match value {
            Value::Text(text) | Value::Node(Expr::RawString { text }) => text.clone(),
            Value::Node(Expr::Literal {
                literal: Literal::String(text),
            }) => text.clone(),
            _ => return Ok(None),
        };
        Ok(Some(Validated::Value(Value::Text(text))))
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated.into_value() {
            Value::Text(text) => self.repr.render(&text, || Value::Text(text.clone())),
            other => other,
        }
    }

    fn keeps_unreadable_text(&self) -> bool {
        matches!(self.repr, Repr::Str | Repr::Keep)
    }
}

// =============================================================================
// LiteralType
// =============================================================================

/// Literal nodes, or strings that read as one
#[derive(Debug, Clone, Default)]
pub struct LiteralType {
    repr: Repr,
}

impl LiteralType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalized_as(repr: Repr) -> Self {
        Self { repr }
    }
}

impl DeclarativeType for LiteralType {
    fn type_name(&self) -> String {
        "LiteralType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        match as_node(value) {
            Some(node @ Expr::Literal { .. }) => Ok(Some(Validated::Value(Value::Node(node)))),
            _ => Ok(None),
        }
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated.into_value() {
            Value::Node(Expr::Literal { literal }) => match self.repr {
                Repr::Str => Value::Text(literal.text()),
                _ => Value::Node(Expr::Literal { literal }),
            },
            other => other,
        }
    }
}

// =============================================================================
// IdentifierType / ColumnType
// =============================================================================

/// Identifier nodes, or a string holding exactly one word
#[derive(Debug, Clone, Default)]
pub struct IdentifierType {
    repr: Repr,
}

impl IdentifierType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalized_as(repr: Repr) -> Self {
        Self { repr }
    }
}

impl DeclarativeType for IdentifierType {
    fn type_name(&self) -> String {
        "IdentifierType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        let node = match value {
            Value::Node(node @ Expr::Identifier { .. }) => node.clone(),
            Value::Text(text) | Value::Node(Expr::RawString { text }) => {
                match parse_identifier(text) {
                    Ok(node) => node,
                    Err(_) => return Ok(None),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(Validated::Value(Value::Node(node))))
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated.into_value() {
            Value::Node(Expr::Identifier { name }) => {
                let repr = match self.repr {
                    Repr::Identifier | Repr::Expression => Repr::Keep,
                    repr => repr,
                };
                repr.render(&name, || Value::Node(Expr::identifier(name.clone())))
            }
            other => other,
        }
    }
}

/// Column reference nodes, or strings that read as one
#[derive(Debug, Clone, Default)]
pub struct ColumnType {
    repr: Repr,
}

impl ColumnType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalized_as(repr: Repr) -> Self {
        Self { repr }
    }
}

impl DeclarativeType for ColumnType {
    fn type_name(&self) -> String {
        "ColumnType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        match as_node(value) {
            Some(node @ Expr::Column { .. }) => Ok(Some(Validated::Value(Value::Node(node)))),
            _ => Ok(None),
        }
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated.into_value() {
            Value::Node(Expr::Column { name }) => {
                let repr = match self.repr {
                    Repr::Column => Repr::Keep,
                    repr => repr,
                };
                repr.render(&name, || Value::Node(Expr::column(name.clone())))
            }
            other => other,
        }
    }
}

// =============================================================================
// ExpressionType
// =============================================================================

/// Any expression node, or any string that reads as one
#[derive(Debug, Clone, Default)]
pub struct ExpressionType;

impl ExpressionType {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarativeType for ExpressionType {
    fn type_name(&self) -> String {
        "ExpressionType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        Ok(as_node(value).map(|node| Validated::Value(Value::Node(node))))
    }

    fn normalize(&self, validated: Validated) -> Value {
        validated.into_value()
    }
}

// =============================================================================
// EnumType
// =============================================================================

/// One of a closed set of words
///
/// Matching is case-insensitive unless configured otherwise. The validated
/// value is always the declared spelling, so `hash` validates as `HASH`.
#[derive(Debug, Clone)]
pub struct EnumType {
    values: Vec<String>,
    repr: Repr,
    case_sensitive: bool,
}

impl EnumType {
    pub fn new<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(PropertyError::SchemaDefinition(
                "EnumType requires at least one value".to_string(),
            ));
        }
        Ok(Self {
            values,
            repr: Repr::Str,
            case_sensitive: false,
        })
    }

    pub fn normalized_as(mut self, repr: Repr) -> Self {
        self.repr = repr;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn extract_text(value: &Value) -> Option<String> {
        match value {
            Value::Text(text) | Value::Node(Expr::RawString { text }) => {
                match parse_fragment(text) {
                    Ok(
                        node @ (Expr::Identifier { .. } | Expr::Column { .. } | Expr::Literal { .. }),
                    ) => node.text(),
                    _ => Some(text.trim().to_string()),
                }
            }
            Value::Node(
                node @ (Expr::Identifier { .. } | Expr::Column { .. } | Expr::Literal { .. }),
            ) => node.text(),
            _ => None,
        }
    }

    fn matches(&self, candidate: &str, allowed: &str) -> bool {
        if self.case_sensitive {
            candidate == allowed
        } else {
            candidate.eq_ignore_ascii_case(allowed)
        }
    }
}

impl DeclarativeType for EnumType {
    fn type_name(&self) -> String {
        format!("EnumType[{}]", self.values.join(", "))
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        let Some(text) = Self::extract_text(value) else {
            return Ok(None);
        };
        Ok(self
            .values
            .iter()
            .find(|allowed| self.matches(&text, allowed))
            .map(|allowed| Validated::Value(Value::Text(allowed.clone()))))
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated.into_value() {
            Value::Text(text) => match self.repr {
                Repr::Keep | Repr::Str => Value::Text(text),
                repr => repr.render(&text, || Value::Text(text.clone())),
            },
            other => other,
        }
    }
}

// =============================================================================
// EqType
// =============================================================================

/// A binary `key = value`, decomposed into a name and a value node
#[derive(Debug, Clone, Default)]
pub struct EqType;

impl EqType {
    pub fn new() -> Self {
        Self
    }

    /// Name of the left-hand side of an equality
    fn key_name(key: &Expr) -> String {
        match key {
            Expr::Column { name } | Expr::Identifier { name } => name.clone(),
            Expr::Literal { literal } => literal.text(),
            Expr::RawString { text } => text.clone(),
            other => other.to_string(),
        }
    }

    /// Decompose into `(name, value)`, or `None` if not an equality
    pub fn decompose(&self, value: &Value) -> Option<(String, Expr)> {
        if let Value::Pair { key, value } = value {
            return Some((key.clone(), value.clone()));
        }
        match as_node(value)? {
            Expr::Equality { key, value } => Some((Self::key_name(&key), *value)),
            _ => None,
        }
    }
}

impl DeclarativeType for EqType {
    fn type_name(&self) -> String {
        "EqType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        Ok(self
            .decompose(value)
            .map(|(key, value)| Validated::Value(Value::Pair { key, value })))
    }

    fn normalize(&self, validated: Validated) -> Value {
        validated.into_value()
    }
}

// =============================================================================
// FuncType
// =============================================================================

/// Function calls, known or anonymous (`date_trunc(...)`, `RANGE(...)`)
#[derive(Debug, Clone, Default)]
pub struct FuncType;

impl FuncType {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarativeType for FuncType {
    fn type_name(&self) -> String {
        "FuncType".to_string()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        match as_node(value) {
            Some(node @ Expr::Function { .. }) => Ok(Some(Validated::Value(Value::Node(node)))),
            _ => Ok(None),
        }
    }

    fn normalize(&self, validated: Validated) -> Value {
        validated.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn node(expr: Expr) -> Value {
        Value::Node(expr)
    }

    #[test]
    fn test_string_type() {
        let ty = StringType::new();
        assert_eq!(ty.apply(&Value::text("SSD")).unwrap(), Some(Value::text("SSD")));
        assert_eq!(ty.apply(&node(Expr::raw("p1"))).unwrap(), Some(Value::text("p1")));
        assert_eq!(ty.apply(&node(Expr::string("x"))).unwrap(), Some(Value::text("x")));
        assert_eq!(ty.apply(&node(Expr::column("id"))).unwrap(), None);

        let as_column = StringType::normalized_as(Repr::Column);
        assert_eq!(
            as_column.apply(&Value::text("dt")).unwrap(),
            Some(node(Expr::column("dt")))
        );
    }

    #[test]
    fn test_literal_type() {
        let keep = LiteralType::new();
        assert_eq!(keep.apply(&Value::text("10")).unwrap(), Some(node(Expr::number("10"))));
        assert_eq!(keep.apply(&Value::text("id")).unwrap(), None);

        let as_str = LiteralType::normalized_as(Repr::Str);
        assert_eq!(as_str.apply(&node(Expr::number("3"))).unwrap(), Some(Value::text("3")));
        assert_eq!(as_str.apply(&Value::text("'SSD'")).unwrap(), Some(Value::text("SSD")));
    }

    #[test]
    fn test_identifier_and_column_interop() {
        let ident = IdentifierType::normalized_as(Repr::Column);
        assert_eq!(
            ident.apply(&node(Expr::identifier("id"))).unwrap(),
            Some(node(Expr::column("id")))
        );
        assert_eq!(ident.apply(&Value::text("id")).unwrap(), Some(node(Expr::column("id"))));
        assert_eq!(ident.apply(&node(Expr::column("id"))).unwrap(), None);

        let column = ColumnType::normalized_as(Repr::Identifier);
        assert_eq!(
            column.apply(&Value::text("dt")).unwrap(),
            Some(node(Expr::identifier("dt")))
        );
        let column_str = ColumnType::normalized_as(Repr::Str);
        assert_eq!(column_str.apply(&node(Expr::column("dt"))).unwrap(), Some(Value::text("dt")));
        let column_lit = ColumnType::normalized_as(Repr::Literal);
        assert_eq!(
            column_lit.apply(&node(Expr::column("dt"))).unwrap(),
            Some(node(Expr::string("dt")))
        );
        assert_eq!(ColumnType::new().apply(&Value::text("HASH(id)")).unwrap(), None);
    }

    #[test]
    fn test_expression_type() {
        let ty = ExpressionType::new();
        assert_eq!(
            ty.apply(&Value::text("HASH(id)")).unwrap(),
            Some(node(Expr::function("HASH", vec![Expr::column("id")])))
        );
        assert_eq!(ty.apply(&Value::text("PARTITION p1 VALUES")).unwrap(), None);
        assert_eq!(ty.apply(&Value::List(vec![])).unwrap(), None);
    }

    #[test]
    fn test_enum_type() {
        let ty = EnumType::new(["HASH", "RANDOM"]).unwrap();
        assert_eq!(ty.apply(&Value::text("random")).unwrap(), Some(Value::text("RANDOM")));
        assert_eq!(ty.apply(&node(Expr::string("HASH"))).unwrap(), Some(Value::text("HASH")));
        assert_eq!(ty.apply(&node(Expr::column("Hash"))).unwrap(), Some(Value::text("HASH")));
        assert_eq!(ty.apply(&Value::text("RANGE")).unwrap(), None);
        assert_eq!(ty.apply(&node(Expr::function("HASH", vec![]))).unwrap(), None);

        let strict = EnumType::new(["HASH"]).unwrap().case_sensitive(true);
        assert_eq!(strict.apply(&Value::text("hash")).unwrap(), None);

        let as_ident = EnumType::new(["HASH"]).unwrap().normalized_as(Repr::Expression);
        assert_eq!(
            as_ident.apply(&Value::text("hash")).unwrap(),
            Some(node(Expr::identifier("HASH")))
        );

        assert!(EnumType::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_eq_type() {
        let ty = EqType::new();
        assert_eq!(
            ty.apply(&Value::text("buckets = 10")).unwrap(),
            Some(Value::Pair {
                key: "buckets".to_string(),
                value: Expr::number("10"),
            })
        );
        assert_eq!(ty.apply(&Value::text("(a, b)")).unwrap(), None);
    }

    #[test]
    fn test_func_type() {
        let ty = FuncType::new();
        assert!(ty.apply(&Value::text("date_trunc('day', dt)")).unwrap().is_some());
        assert!(ty.apply(&Value::text("RANGE(dt)")).unwrap().is_some());
        assert_eq!(ty.apply(&Value::text("dt")).unwrap(), None);
    }

    #[test]
    fn test_convert_raises_on_mismatch() {
        let err = FuncType::new().convert(&Value::text("dt")).unwrap_err();
        assert!(err.to_string().contains("FuncType"));
    }
}
