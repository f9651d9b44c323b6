//! Combinators over declarative types
//!
//! Combinators never raise on their own: a child that does not match is plain
//! absence. An error raised by a child (a structured tuple configured to
//! raise) is propagated unchanged.

use crate::error::{PropertyError, Result};
use crate::expr::Expr;
use crate::fragment::parse_fragment;
use crate::value::Value;

use super::{join_type_names, DeclarativeType, TypeRef, Validated};

/// Validate `value` against the first matching type, in declared order
fn first_match(types: &[TypeRef], value: &Value) -> Result<Option<(usize, Validated)>> {
    for (index, ty) in types.iter().enumerate() {
        if let Some(validated) = ty.validate(value)? {
            return Ok(Some((index, validated)));
        }
    }
    Ok(None)
}

fn require_members(combinator: &str, types: &[TypeRef]) -> Result<()> {
    if types.is_empty() {
        return Err(PropertyError::SchemaDefinition(format!(
            "{} requires at least one member type",
            combinator
        )));
    }
    Ok(())
}

// =============================================================================
// AnyOf
// =============================================================================

/// Ordered alternation: the first member that validates wins
#[derive(Debug, Clone)]
pub struct AnyOf {
    types: Vec<TypeRef>,
}

impl AnyOf {
    pub fn new(types: Vec<TypeRef>) -> Result<Self> {
        require_members("AnyOf", &types)?;
        Ok(Self { types })
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.types
    }
}

impl DeclarativeType for AnyOf {
    fn type_name(&self) -> String {
        format!("AnyOf[{}]", join_type_names(&self.types))
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        Ok(first_match(&self.types, value)?.map(|(index, inner)| Validated::Branch {
            index,
            inner: Box::new(inner),
        }))
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated {
            Validated::Branch { index, inner } => match self.types.get(index) {
                Some(ty) => ty.normalize(*inner),
                None => inner.into_value(),
            },
            other => other.into_value(),
        }
    }
}

// =============================================================================
// SequenceOf
// =============================================================================

/// Homogeneous repetition over the union of member types
///
/// Accepts a tuple node, a host list, or a string reading as either. With
/// `allow_single` (the default) a lone value is promoted to a one-element
/// sequence, so `id` and `(id)` validate to the same shape.
#[derive(Debug, Clone)]
pub struct SequenceOf {
    types: Vec<TypeRef>,
    allow_single: bool,
}

impl SequenceOf {
    pub fn new(types: Vec<TypeRef>) -> Result<Self> {
        require_members("SequenceOf", &types)?;
        Ok(Self {
            types,
            allow_single: true,
        })
    }

    pub fn allow_single(mut self, allow_single: bool) -> Self {
        self.allow_single = allow_single;
        self
    }

    pub fn allows_single(&self) -> bool {
        self.allow_single
    }

    fn keeps_raw_elements(&self) -> bool {
        self.types.iter().any(|ty| ty.keeps_unreadable_text())
    }

    /// Split a value into sequence elements, or `None` if it has no sequence shape
    fn elements(&self, value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::List(items) => Some(items.clone()),
            Value::Node(Expr::Tuple { items }) => {
                Some(items.iter().cloned().map(Value::Node).collect())
            }
            Value::Text(text) | Value::Node(Expr::RawString { text }) => {
                match parse_fragment(text) {
                    Ok(Expr::Tuple { items }) => Some(items.into_iter().map(Value::Node).collect()),
                    Ok(node) if self.allow_single => Some(vec![Value::Node(node)]),
                    Ok(_) => None,
                    // Only a plain string member may take unreadable text whole
                    Err(_) if self.allow_single && self.keeps_raw_elements() => {
                        Some(vec![value.clone()])
                    }
                    Err(_) => None,
                }
            }
            Value::Node(node) if self.allow_single => Some(vec![Value::Node(node.clone())]),
            _ => None,
        }
    }

    fn validate_elements(&self, elements: &[Value]) -> Result<Option<Validated>> {
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            match first_match(&self.types, element)? {
                Some(item) => items.push(item),
                None => return Ok(None),
            }
        }
        Ok(Some(Validated::Items(items)))
    }
}

impl DeclarativeType for SequenceOf {
    fn type_name(&self) -> String {
        format!("SequenceOf[{}]", join_type_names(&self.types))
    }

    fn validate(&self, value: &Value) -> Result<Option<Validated>> {
        match self.elements(value) {
            Some(elements) => self.validate_elements(&elements),
            None => Ok(None),
        }
    }

    fn normalize(&self, validated: Validated) -> Value {
        match validated {
            Validated::Items(items) => Value::List(
                items
                    .into_iter()
                    .map(|(index, item)| match self.types.get(index) {
                        Some(ty) => ty.normalize(item),
                        None => item.into_value(),
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
    use crate::types::{ColumnType, FuncType, IdentifierType, Repr, StringType};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn columns() -> SequenceOf {
        SequenceOf::new(vec![
            Arc::new(ColumnType::new()),
            Arc::new(IdentifierType::normalized_as(Repr::Column)),
        ])
        .unwrap()
    }

    #[test]
    fn test_any_of_order_decides_winner() {
        let string_first = AnyOf::new(vec![
            Arc::new(StringType::new()),
            Arc::new(ColumnType::new()),
        ])
        .unwrap();
        let column_first = AnyOf::new(vec![
            Arc::new(ColumnType::new()),
            Arc::new(StringType::new()),
        ])
        .unwrap();

        let input = Value::text("id");
        for _ in 0..3 {
            assert_eq!(string_first.apply(&input).unwrap(), Some(Value::text("id")));
            assert_eq!(
                column_first.apply(&input).unwrap(),
                Some(Value::Node(Expr::column("id")))
            );
        }
    }

    #[test]
    fn test_any_of_absence() {
        let ty = AnyOf::new(vec![Arc::new(FuncType::new())]).unwrap();
        assert_eq!(ty.apply(&Value::text("id")).unwrap(), None);
        assert!(AnyOf::new(vec![]).is_err());
    }

    #[test]
    fn test_sequence_promotion() {
        let ty = columns();
        let single = ty.apply(&Value::text("id")).unwrap();
        let tuple = ty.apply(&Value::text("(id)")).unwrap();
        assert_eq!(single, Some(Value::List(vec![Expr::column("id").into()])));
        assert_eq!(single, tuple);
    }

    #[test]
    fn test_sequence_of_tuple_and_list() {
        let ty = columns();
        let expected = Some(Value::List(vec![
            Expr::column("id").into(),
            Expr::column("dt").into(),
        ]));
        assert_eq!(ty.apply(&Value::text("(id, dt)")).unwrap(), expected);
        assert_eq!(
            ty.apply(&Value::List(vec![
                Expr::identifier("id").into(),
                Value::text("dt"),
            ]))
            .unwrap(),
            expected
        );
    }

    #[test]
    fn test_sequence_fails_on_any_element() {
        let ty = columns();
        assert_eq!(ty.apply(&Value::text("(id, HASH(dt))")).unwrap(), None);
    }

    #[test]
    fn test_sequence_without_promotion() {
        let ty = columns().allow_single(false);
        assert_eq!(ty.apply(&Value::text("id")).unwrap(), None);
        assert!(ty.apply(&Value::text("(id)")).unwrap().is_some());
    }

    #[test]
    fn test_readable_string_is_not_kept_whole() {
        let ty = SequenceOf::new(vec![
            Arc::new(ColumnType::new()),
            Arc::new(StringType::normalized_as(Repr::Column)),
        ])
        .unwrap();
        assert_eq!(ty.apply(&Value::text("HASH(id)")).unwrap(), None);
    }

    #[test]
    fn test_unreadable_string_rejected_without_plain_string_member() {
        let ty = SequenceOf::new(vec![
            Arc::new(ColumnType::new()),
            Arc::new(IdentifierType::normalized_as(Repr::Column)),
            Arc::new(StringType::normalized_as(Repr::Column)),
        ])
        .unwrap();
        assert_eq!(ty.apply(&Value::text("(id, dt")).unwrap(), None);
        assert_eq!(ty.apply(&Value::text("id dt")).unwrap(), None);
        assert_eq!(
            ty.apply(&Value::text("(id, ü)")).unwrap(),
            Some(Value::List(vec![
                Expr::column("id").into(),
                Expr::column("ü").into(),
            ]))
        );
    }

    #[test]
    fn test_sequence_keeps_unreadable_string_whole() {
        let ty = SequenceOf::new(vec![Arc::new(StringType::new())]).unwrap();
        let partition = "PARTITION p1 VALUES LESS THAN ('2024-01-01')";
        assert_eq!(
            ty.apply(&Value::text(partition)).unwrap(),
            Some(Value::List(vec![Value::text(partition)]))
        );
    }
}
