//! Property Schemas
//!
//! Declarative validation and normalization of loosely-structured table
//! properties. Raw values (bare names, parenthesized groups, `key=value`
//! tuples, function calls, plain strings) are checked against an input type,
//! converted into one canonical shape, and verified against an output type
//! before consumers see them.
//!
//! ## Features
//!
//! - **Declarative Types**: primitives, `AnyOf`/`SequenceOf` combinators and
//!   structured tuples with aliases and required fields
//! - **Two-Stage Pipeline**: input validation and output contract checks are
//!   distinct error kinds
//! - **Configurable Policy**: unknown/invalid field handling from `properties.toml`
//!   or `PROPERTIES__*` environment variables
//! - **Stateless Schemas**: built once, shared across threads
//!
//! ## Architecture
//!
//! ```text
//! expr.rs          Expr / Literal node tree
//! value.rs         Value: node | text | list | mapping | pair
//! fragment.rs      nom reader for string fragments
//! types/           DeclarativeType trait, primitives, combinators, structured tuples
//! specs.rs         input/output registries and validate_and_normalize
//! distribution.rs  distributed_by in one shape
//! table_key.rs     key extraction and column reordering
//! ```
//!
//! ## Example
//!
//! ```
//! use property_schemas::{PropertySpecs, Value};
//!
//! let specs = PropertySpecs::default();
//! let out = specs
//!     .validate_and_normalize("distributed_by", &Value::text("(kind='HASH', expressions=(id, dt), bucket_num=10)"))
//!     .unwrap();
//! assert_eq!(out.to_string(), r#"{kind: "HASH", columns: [id, dt], buckets: 10}"#);
//! ```

pub mod config;
pub mod distribution;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod specs;
pub mod table_key;
pub mod types;
pub mod value;

pub use config::{PropertiesConfig, ValidationConfig};
pub use distribution::{Distribution, DistributionKind};
pub use error::{ErrorKind, PropertyError, Result};
pub use expr::{Expr, FunctionCall, Literal};
pub use fragment::{parse_fragment, parse_identifier};
pub use specs::PropertySpecs;
pub use table_key::{column_names, KeyKind, TableKey};
pub use types::{
    AnyOf, ColumnType, DeclarativeType, EnumType, EqType, ExpressionType, Field, FieldDoc,
    FieldPolicy, FuncType, IdentifierType, LiteralType, Repr, SequenceOf, StringType,
    StructuredTupleType, TypeRef, Validated,
};
pub use value::Value;
