//! Structured tuples: `(key = value, ...)` checked against a field table

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PropertyError, Result};
use crate::expr::Expr;
use crate::fragment::parse_fragment;
use crate::value::Value;

use super::{DeclarativeType, EqType, TypeRef, Validated};

// =============================================================================
// Field
// =============================================================================

/// A named leaf of a structured tuple
///
/// Carries no behavior beyond its type; the metadata is read by
/// [`StructuredTupleType`].
#[derive(Debug, Clone)]
pub struct Field {
    pub ty: TypeRef,
    pub required: bool,
    pub aliases: Vec<String>,
    pub doc: Option<String>,
}

impl Field {
    pub fn new(ty: impl DeclarativeType + 'static) -> Self {
        Self::shared(Arc::new(ty))
    }

    pub fn shared(ty: TypeRef) -> Self {
        Self {
            ty,
            required: false,
            aliases: Vec::new(),
            doc: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// Error policy of a structured tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    /// Raise on keys matching no field or alias, instead of dropping them
    #[serde(default)]
    pub error_on_unknown_field: bool,

    /// Raise on invalid or missing fields, instead of yielding absence
    #[serde(default = "default_true")]
    pub error_on_invalid_field: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self {
            error_on_unknown_field: false,
            error_on_invalid_field: true,
        }
    }
}

/// One row of [`StructuredTupleType::describe`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub type_name: String,
    pub required: bool,
    pub aliases: Vec<String>,
    pub doc: Option<String>,
}

// =============================================================================
// StructuredTupleType
// =============================================================================

/// A tuple of `key = value` pairs validated against an ordered field table
///
/// Keys resolve to canonical field names by exact match first, then by alias.
/// When one field is given more than once (directly or through aliases) the
/// last pair in source order wins. Output fields follow table order.
#[derive(Debug, Clone)]
pub struct StructuredTupleType {
    name: String,
    fields: IndexMap<String, Field>,
    aliases: HashMap<String, String>,
    policy: FieldPolicy,
}

impl StructuredTupleType {
    pub fn new<I, S>(name: impl Into<String>, fields: I, policy: FieldPolicy) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut table = IndexMap::new();
        for (field_name, field) in fields {
            let field_name = field_name.into();
            if table.insert(field_name.clone(), field).is_some() {
                return Err(PropertyError::SchemaDefinition(format!(
                    "{}: field '{}' declared twice",
                    name, field_name
                )));
            }
        }

        let mut aliases = HashMap::new();
        for (field_name, field) in &table {
            for alias in &field.aliases {
                if table.contains_key(alias) {
                    return Err(PropertyError::SchemaDefinition(format!(
                        "{}: alias '{}' of field '{}' shadows a field name",
                        name, alias, field_name
                    )));
                }
                if let Some(owner) = aliases.insert(alias.clone(), field_name.clone()) {
                    return Err(PropertyError::SchemaDefinition(format!(
                        "{}: alias '{}' claimed by both '{}' and '{}'",
                        name, alias, owner, field_name
                    )));
                }
            }
        }

        Ok(Self {
            name,
            fields: table,
            aliases,
            policy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> FieldPolicy {
        self.policy
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.fields
    }

    /// Canonical field name for a key or alias
    pub fn resolve(&self, key: &str) -> Option<&str> {
        if let Some((name, _)) = self.fields.get_key_value(key) {
            return Some(name);
        }
        self.aliases.get(key).map(String::as_str)
    }

    /// Field table in declaration order, for documentation
    pub fn describe(&self) -> Vec<FieldDoc> {
        self.fields
            .iter()
            .map(|(name, field)| FieldDoc {
                name: name.clone(),
                type_name: field.ty.type_name(),
                required: field.required,
                aliases: field.aliases.clone(),
                doc: field.doc.clone(),
            })
            .collect()
    }

    /// Split the input into `(key, value)` pairs plus the items that are not pairs
    fn pairs(&self, value: &Value) -> Option<(Vec<(String, Value)>, Vec<Value>)> {
        let items: Vec<Value> = match value {
            Value::Map(map) => {
                return Some((
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    Vec::new(),
                ))
            }
            Value::List(items) => items.clone(),
            Value::Text(text) | Value::Node(Expr::RawString { text }) => {
                match parse_fragment(text) {
                    Ok(node) => return self.pairs(&Value::Node(node)),
                    Err(_) => return None,
                }
            }
            Value::Node(Expr::Tuple { items }) => items.iter().cloned().map(Value::Node).collect(),
            Value::Node(node @ Expr::Equality { .. }) => vec![Value::Node(node.clone())],
            _ => return None,
        };

        let eq = EqType::new();
        let mut pairs = Vec::new();
        let mut strays = Vec::new();
        for item in items {
            match eq.decompose(&item) {
                Some((key, value)) => pairs.push((key, Value::Node(value))),
                None => strays.push(item),
            }
        }
        // A plain tuple like `(id, dt)` is not a structured tuple at all
        if pairs.is_empty() && !strays.is_empty() {
            return None;
        }
        Some((pairs, strays))
    }

    fn unknown(&self, field: String) -> Result<()> {
        if self.policy.error_on_unknown_field {
            return Err(PropertyError::UnknownField {
                schema: self.name.clone(),
                field,
                valid: self.fields.keys().cloned().collect(),
            });
        }
        warn!(schema = %self.name, field = %field, "Dropping unknown field");
        Ok(())
    }
}

impl DeclarativeType for StructuredTupleType {
    fn type_name(&self) -> String {
        self.name.clone()
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        let Some((pairs, strays)) = self.pairs(value) else {
            return Ok(None);
        };
        for stray in strays {
            self.unknown(stray.to_string())?;
        }

        let mut matched: HashMap<&str, Validated> = HashMap::new();
        for (key, value) in pairs {
            let Some(canonical) = self.resolve(&key) else {
                self.unknown(key)?;
                continue;
            };
            let field = &self.fields[canonical];
            match field.ty.validate(&value)? {
                Some(validated) => {
                    if matched.insert(canonical, validated).is_some() {
                        debug!(schema = %self.name, field = canonical, key = %key, "Field given more than once, keeping the last");
                    }
                }
                None if self.policy.error_on_invalid_field => {
                    return Err(PropertyError::InvalidField {
                        schema: self.name.clone(),
                        field: canonical.to_string(),
                        value: value.to_string(),
                        expected: field.ty.type_name(),
                    });
                }
                None => return Ok(None),
            }
        }

        let mut fields = IndexMap::new();
        for (name, field) in &self.fields {
            match matched.remove(name.as_str()) {
                Some(validated) => {
                    fields.insert(name.clone(), validated);
                }
                None if field.required => {
                    if self.policy.error_on_invalid_field {
                        return Err(PropertyError::MissingField {
                            schema: self.name.clone(),
                            field: name.clone(),
                        });
                    }
                    return Ok(None);
                }
                None => {}
            }
        }
        Ok(Some(Validated::Fields(fields)))
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated {
            Validated::Fields(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(name, validated)| {
                        let value = match self.fields.get(&name) {
                            Some(field) => field.ty.normalize(validated),
                            None => validated.into_value(),
                        };
                        (name, value)
                    })
                    .collect(),
            ),
            other => other.into_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{ColumnType, EnumType, LiteralType, SequenceOf};
    use pretty_assertions::assert_eq;

    fn schema(policy: FieldPolicy) -> StructuredTupleType {
        StructuredTupleType::new(
            "Sample",
            [
                ("kind", Field::new(EnumType::new(["HASH", "RANDOM"]).unwrap()).required()),
                (
                    "columns",
                    Field::new(SequenceOf::new(vec![Arc::new(ColumnType::new())]).unwrap())
                        .alias("expressions"),
                ),
                (
                    "buckets",
                    Field::new(LiteralType::new())
                        .alias("bucket")
                        .alias("bucket_num")
                        .doc("Number of buckets"),
                ),
            ],
            policy,
        )
        .unwrap()
    }

    #[test]
    fn test_output_follows_field_order() {
        let ty = schema(FieldPolicy::default());
        let out = ty.apply(&Value::text("(buckets=4, kind='HASH')")).unwrap().unwrap();
        let keys: Vec<_> = out.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["kind", "buckets"]);
    }

    #[test]
    fn test_duplicate_alias_last_wins() {
        let ty = schema(FieldPolicy::default());
        let out = ty
            .apply(&Value::text("(kind='HASH', bucket=4, bucket_num=8)"))
            .unwrap()
            .unwrap();
        assert_eq!(out.as_map().unwrap()["buckets"], Value::Node(Expr::number("8")));
    }

    #[test]
    fn test_empty_tuple_needs_no_required_fields() {
        let strict = schema(FieldPolicy::default());
        let err = strict.apply(&Value::text("()")).unwrap_err();
        assert_eq!(err.field(), Some("kind"));

        let optional = StructuredTupleType::new(
            "Optional",
            [("buckets", Field::new(LiteralType::new()))],
            FieldPolicy::default(),
        )
        .unwrap();
        assert_eq!(
            optional.apply(&Value::text("()")).unwrap(),
            Some(Value::Map(IndexMap::new()))
        );
    }

    #[test]
    fn test_invalid_field_policy() {
        let raising = schema(FieldPolicy::default());
        let err = raising.apply(&Value::text("(kind='RANGE')")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidField);
        assert_eq!(err.field(), Some("kind"));

        let quiet = schema(FieldPolicy {
            error_on_invalid_field: false,
            ..FieldPolicy::default()
        });
        assert_eq!(quiet.apply(&Value::text("(kind='RANGE')")).unwrap(), None);
        assert_eq!(quiet.apply(&Value::text("(buckets=2)")).unwrap(), None);
    }

    #[test]
    fn test_plain_tuple_is_not_structured() {
        let ty = schema(FieldPolicy::default());
        assert_eq!(ty.apply(&Value::text("(id, dt)")).unwrap(), None);
        assert_eq!(ty.apply(&Value::text("HASH(id)")).unwrap(), None);
    }

    #[test]
    fn test_stray_items_are_unknown_fields() {
        let lenient = schema(FieldPolicy::default());
        let out = lenient.apply(&Value::text("(kind='HASH', 'x')")).unwrap().unwrap();
        let keys: Vec<_> = out.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["kind"]);

        let strict = schema(FieldPolicy {
            error_on_unknown_field: true,
            ..FieldPolicy::default()
        });
        let err = strict.apply(&Value::text("(kind='HASH', 'x')")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        assert_eq!(err.field(), Some("'x'"));
    }

    #[test]
    fn test_canonical_mapping_revalidates() {
        let ty = schema(FieldPolicy::default());
        let out = ty
            .apply(&Value::text("(kind='HASH', expressions=(id))"))
            .unwrap()
            .unwrap();
        assert_eq!(ty.apply(&out).unwrap(), Some(out));
    }

    #[test]
    fn test_alias_collisions_rejected() {
        let shadowing = StructuredTupleType::new(
            "Bad",
            [
                ("a", Field::new(LiteralType::new()).alias("b")),
                ("b", Field::new(LiteralType::new())),
            ],
            FieldPolicy::default(),
        );
        assert!(shadowing.is_err());

        let shared = StructuredTupleType::new(
            "Bad",
            [
                ("a", Field::new(LiteralType::new()).alias("x")),
                ("b", Field::new(LiteralType::new()).alias("x")),
            ],
            FieldPolicy::default(),
        );
        assert_eq!(shared.unwrap_err().kind(), ErrorKind::Definition);
    }

    #[test]
    fn test_describe() {
        let docs = schema(FieldPolicy::default()).describe();
        assert_eq!(docs.len(), 3);
        assert!(docs[0].required);
        assert_eq!(docs[2].aliases, vec!["bucket", "bucket_num"]);
        assert_eq!(docs[2].doc.as_deref(), Some("Number of buckets"));
    }
}
