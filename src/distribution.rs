//! Unified distribution
//!
//! A canonical `distributed_by` value comes in one of three shapes: a mapping
//! from the structured tuple, the `RANDOM` keyword, or a `HASH(...)` /
//! `RANDOM()` call. [`Distribution`] folds them into one struct.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PropertyError, Result};
use crate::expr::{Expr, Literal};
use crate::fragment::parse_fragment;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DistributionKind {
    Hash,
    Random,
}

impl DistributionKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "HASH" => Some(DistributionKind::Hash),
            "RANDOM" => Some(DistributionKind::Random),
            _ => None,
        }
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionKind::Hash => write!(f, "HASH"),
            DistributionKind::Random => write!(f, "RANDOM"),
        }
    }
}

/// Distribution in one shape, whatever form it was written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub kind: DistributionKind,
    pub columns: Vec<Expr>,
    pub buckets: Option<Expr>,
}

impl Distribution {
    /// From the `RANDOM` keyword
    pub fn from_keyword(keyword: &str, buckets: Option<Expr>) -> Result<Self> {
        let kind = DistributionKind::parse(keyword).ok_or_else(|| {
            PropertyError::Distribution(format!("unknown distribution keyword '{}'", keyword))
        })?;
        Ok(Self {
            kind,
            columns: Vec::new(),
            buckets,
        })
    }

    /// From `HASH(id, dt)` or `RANDOM()`
    pub fn from_function(node: &Expr, buckets: Option<Expr>) -> Result<Self> {
        let Expr::Function { call } = node else {
            return Err(PropertyError::Distribution(format!(
                "expected a function call, got {}",
                node.kind()
            )));
        };
        match call.upper_name().as_str() {
            "HASH" => Ok(Self {
                kind: DistributionKind::Hash,
                columns: call.args.clone(),
                buckets,
            }),
            "RANDOM" => Ok(Self {
                kind: DistributionKind::Random,
                columns: Vec::new(),
                buckets,
            }),
            other => Err(PropertyError::Distribution(format!(
                "unknown distribution function: {}",
                other
            ))),
        }
    }

    /// From any canonical `distributed_by` value
    ///
    /// `buckets` applies only when the value carries no bucket count itself.
    pub fn from_normalized(value: &Value, buckets: Option<Expr>) -> Result<Self> {
        match value {
            Value::Map(fields) => {
                let kind = fields
                    .get("kind")
                    .and_then(|kind| match kind {
                        Value::Text(text) => Some(text.clone()),
                        Value::Node(node) => node.text(),
                        _ => None,
                    })
                    .ok_or_else(|| PropertyError::Distribution("missing 'kind'".to_string()))?;
                let mut distribution = Self::from_keyword(&kind, None)?;
                if let Some(columns) = fields.get("columns") {
                    distribution.columns = column_nodes(columns)?;
                }
                distribution.buckets = match fields.get("buckets") {
                    Some(count) => Some(bucket_node(count)?),
                    None => buckets,
                };
                Ok(distribution)
            }
            Value::Text(text) => Self::from_keyword(text, buckets),
            Value::Node(node @ Expr::Function { .. }) => Self::from_function(node, buckets),
            other => Err(PropertyError::Distribution(format!(
                "cannot build a distribution from a {}",
                other.kind()
            ))),
        }
    }

    /// Bucket count as an integer, when it is numeric
    pub fn bucket_count(&self) -> Option<i64> {
        match &self.buckets {
            Some(Expr::Literal { literal }) => literal.as_i64(),
            _ => None,
        }
    }
}

fn column_nodes(value: &Value) -> Result<Vec<Expr>> {
    match value {
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Node(node) => Ok(node.clone()),
                Value::Text(name) => Ok(Expr::column(name.clone())),
                other => Err(PropertyError::Distribution(format!(
                    "invalid distribution column {}",
                    other
                ))),
            })
            .collect(),
        other => Err(PropertyError::Distribution(format!(
            "distribution columns must be a list, got {}",
            other.kind()
        ))),
    }
}

/// Bucket text `'10'` becomes the numeric literal `10`
fn bucket_node(value: &Value) -> Result<Expr> {
    match value {
        Value::Node(node @ Expr::Literal { literal: Literal::Number(_) }) => Ok(node.clone()),
        Value::Node(Expr::Literal {
            literal: Literal::String(text),
        })
        | Value::Text(text) => match parse_fragment(text) {
            Ok(node @ Expr::Literal { literal: Literal::Number(_) }) => Ok(node),
            _ => Err(PropertyError::Distribution(format!(
                "bucket count '{}' is not a number",
                text
            ))),
        },
        other => Err(PropertyError::Distribution(format!(
            "bucket count must be a number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::PropertySpecs;
    use pretty_assertions::assert_eq;

    fn canonical(text: &str) -> Value {
        PropertySpecs::default()
            .validate_and_normalize("distributed_by", &Value::text(text))
            .unwrap()
    }

    #[test]
    fn test_from_structured_tuple() {
        let distribution =
            Distribution::from_normalized(&canonical("(kind='HASH', columns=(id, dt), buckets=10)"), None)
                .unwrap();
        assert_eq!(
            distribution,
            Distribution {
                kind: DistributionKind::Hash,
                columns: vec![Expr::column("id"), Expr::column("dt")],
                buckets: Some(Expr::number("10")),
            }
        );
    }

    #[test]
    fn test_string_buckets_become_numbers() {
        let distribution =
            Distribution::from_normalized(&canonical("(kind='HASH', columns=id, buckets='8')"), None)
                .unwrap();
        assert_eq!(distribution.bucket_count(), Some(8));

        let err = Distribution::from_normalized(
            &canonical("(kind='HASH', columns=id, buckets='many')"),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Conversion);
    }

    #[test]
    fn test_from_keyword_and_function() {
        let random = Distribution::from_normalized(&canonical("RANDOM"), Some(Expr::number("4"))).unwrap();
        assert_eq!(random.kind, DistributionKind::Random);
        assert!(random.columns.is_empty());
        assert_eq!(random.bucket_count(), Some(4));

        let hash = Distribution::from_normalized(&canonical("HASH(id, dt)"), None).unwrap();
        assert_eq!(hash.kind, DistributionKind::Hash);
        assert_eq!(hash.columns.len(), 2);

        let call = Distribution::from_normalized(&canonical("random()"), None).unwrap();
        assert_eq!(call.kind, DistributionKind::Random);
    }

    #[test]
    fn test_override_only_fills_missing_buckets() {
        let explicit = Distribution::from_normalized(
            &canonical("(kind='HASH', columns=(id), buckets=10)"),
            Some(Expr::number("3")),
        )
        .unwrap();
        assert_eq!(explicit.bucket_count(), Some(10));

        let filled = Distribution::from_normalized(
            &canonical("(kind='RANDOM')"),
            Some(Expr::number("3")),
        )
        .unwrap();
        assert_eq!(filled.bucket_count(), Some(3));
    }

    #[test]
    fn test_unknown_function() {
        let err = Distribution::from_function(&Expr::function("RANGE", vec![]), None).unwrap_err();
        assert!(err.to_string().contains("RANGE"));
    }
}
