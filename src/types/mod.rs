//! Declarative type system
//!
//! A declarative type splits its work in two pure steps:
//! - `validate(value)` checks the shape and returns an intermediate
//!   [`Validated`] value, or `None` when the value does not belong to the type
//! - `normalize(validated)` converts that intermediate value into the
//!   canonical output [`Value`]
//!
//! Types are built once, hold no per-call state and are shared as
//! [`TypeRef`] (`Arc<dyn DeclarativeType>`), so one schema instance can serve
//! every validation on every thread.
//!
//! ## Layers
//!
//! ```text
//! primitive.rs   StringType, LiteralType, IdentifierType, ColumnType,
//!                ExpressionType, EnumType, EqType, FuncType
//! combinator.rs  AnyOf (ordered alternation), SequenceOf (repetition)
//! structured.rs  Field, FieldPolicy, StructuredTupleType
//! ```

pub mod combinator;
pub mod primitive;
pub mod structured;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{PropertyError, Result};
use crate::expr::{Expr, Literal};
use crate::value::Value;

pub use combinator::{AnyOf, SequenceOf};
pub use primitive::{
    ColumnType, EnumType, EqType, ExpressionType, FuncType, IdentifierType, LiteralType, StringType,
};
pub use structured::{Field, FieldDoc, FieldPolicy, StructuredTupleType};

/// Shared handle to a declarative type
pub type TypeRef = Arc<dyn DeclarativeType>;

/// Intermediate result of a successful `validate`
///
/// Only `validate` produces these, which keeps `normalize` from ever seeing a
/// value that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    /// A checked scalar, node, pair or list
    Value(Value),
    /// The alternative of an `AnyOf` that matched
    Branch { index: usize, inner: Box<Validated> },
    /// Sequence elements with the index of the element type that matched
    Items(Vec<(usize, Validated)>),
    /// Structured fields by canonical name, in field-table order
    Fields(IndexMap<String, Validated>),
}

impl Validated {
    /// Collapse into a plain value without any type-specific conversion
    pub fn into_value(self) -> Value {
        match self {
            Validated::Value(value) => value,
            Validated::Branch { inner, .. } => inner.into_value(),
            Validated::Items(items) => {
                Value::List(items.into_iter().map(|(_, item)| item.into_value()).collect())
            }
            Validated::Fields(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(name, field)| (name, field.into_value()))
                    .collect(),
            ),
        }
    }
}

/// A validator/normalizer pair over [`Value`]s
pub trait DeclarativeType: fmt::Debug + Send + Sync {
    /// Human readable type name used in error messages
    fn type_name(&self) -> String;

    /// Check whether `value` belongs to this type.
    ///
    /// `Ok(None)` is the ordinary "does not match" answer. `Err` is reserved
    /// for types configured to raise (structured tuples).
    fn validate(&self, value: &Value) -> Result<Option<Validated>>;

    /// Convert a validated value into its canonical form
    fn normalize(&self, validated: Validated) -> Value;

    /// Whether text the fragment reader cannot read is still a whole value
    /// of this type. Only plain string types say yes.
    fn keeps_unreadable_text(&self) -> bool {
        false
    }

    /// Validate then normalize; absence propagates
    fn apply(&self, value: &Value) -> Result<Option<Value>> {
        Ok(self.validate(value)?.map(|validated| self.normalize(validated)))
    }

    /// Validate then normalize, raising when the value does not conform
    fn convert(&self, value: &Value) -> Result<Value> {
        self.apply(value)?.ok_or_else(|| PropertyError::NonConforming {
            value: value.to_string(),
            expected: self.type_name(),
        })
    }
}

/// Canonical representation a scalar type normalizes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repr {
    /// Whatever shape the type validated
    #[default]
    Keep,
    /// A plain string
    Str,
    Identifier,
    Column,
    /// A string literal node
    Literal,
    /// A generic expression node (rendered as an identifier)
    Expression,
}

impl Repr {
    /// Render a bare name in this representation, `keep` being the type's own shape
    fn render(self, name: &str, keep: impl FnOnce() -> Value) -> Value {
        match self {
            Repr::Keep => keep(),
            Repr::Str => Value::Text(name.to_string()),
            Repr::Identifier | Repr::Expression => Value::Node(Expr::identifier(name)),
            Repr::Column => Value::Node(Expr::column(name)),
            Repr::Literal => Value::Node(Expr::Literal {
                literal: Literal::string(name),
            }),
        }
    }
}

/// Comma-separated type names, for composite type names
fn join_type_names(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|ty| ty.type_name())
        .collect::<Vec<_>>()
        .join(", ")
}
