//! Table keys
//!
//! A table has at most one key (`primary_key`, `unique_key`, `duplicate_key`
//! or `aggregate_key`), and its columns must come first in the column list,
//! in key order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::error::{PropertyError, Result};
use crate::expr::Expr;
use crate::specs::{AGGREGATE_KEY, DUPLICATE_KEY, PRIMARY_KEY, UNIQUE_KEY};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    PrimaryKey,
    UniqueKey,
    DuplicateKey,
    AggregateKey,
}

impl KeyKind {
    /// Lookup order when scanning properties
    pub const ALL: [KeyKind; 4] = [
        KeyKind::PrimaryKey,
        KeyKind::UniqueKey,
        KeyKind::DuplicateKey,
        KeyKind::AggregateKey,
    ];

    pub fn property_name(self) -> &'static str {
        match self {
            KeyKind::PrimaryKey => PRIMARY_KEY,
            KeyKind::UniqueKey => UNIQUE_KEY,
            KeyKind::DuplicateKey => DUPLICATE_KEY,
            KeyKind::AggregateKey => AGGREGATE_KEY,
        }
    }

    pub fn from_property(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.property_name() == name)
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.property_name())
    }
}

/// The key of a table and its column names, in key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableKey {
    pub kind: KeyKind,
    pub columns: Vec<String>,
}

impl TableKey {
    /// Find the table key among (lower-cased) properties
    ///
    /// An explicit primary key wins over a key property; the superseded
    /// property is removed from `properties`. Returns `Ok(None)` when the
    /// table has no key.
    pub fn extract(
        properties: &mut IndexMap<String, Value>,
        primary_key_override: Option<&[String]>,
    ) -> Result<Option<Self>> {
        let present: Vec<KeyKind> = KeyKind::ALL
            .into_iter()
            .filter(|kind| properties.contains_key(kind.property_name()))
            .collect();

        if present.len() > 1 {
            let names: Vec<_> = present.iter().map(|kind| kind.property_name()).collect();
            return Err(PropertyError::KeyColumns(format!(
                "multiple key types defined: {:?}, only one key type is allowed per table",
                names
            )));
        }

        if let Some(columns) = primary_key_override.filter(|columns| !columns.is_empty()) {
            if let Some(kind) = present.first() {
                warn!(
                    property = kind.property_name(),
                    primary_key = ?columns,
                    "Explicit primary key takes priority over key property"
                );
                properties.shift_remove(kind.property_name());
            }
            return Ok(Some(Self {
                kind: KeyKind::PrimaryKey,
                columns: columns.to_vec(),
            }));
        }

        let Some(kind) = present.first().copied() else {
            return Ok(None);
        };
        let columns = match properties.get(kind.property_name()) {
            Some(value) => column_names(value)?,
            None => return Ok(None),
        };
        info!(key = %kind, columns = ?columns, "Extracted table key");
        Ok(Some(Self { kind, columns }))
    }

    /// Put key columns first, in key order, keeping the order of the rest
    pub fn reorder<T>(&self, mut columns: IndexMap<String, T>) -> Result<IndexMap<String, T>> {
        let missing: Vec<&str> = self
            .columns
            .iter()
            .filter(|name| !columns.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(PropertyError::KeyColumns(format!(
                "{} columns {:?} not found in table columns {:?}",
                self.kind,
                missing,
                columns.keys().collect::<Vec<_>>()
            )));
        }

        let original: Vec<String> = columns.keys().cloned().collect();
        let mut reordered = IndexMap::with_capacity(columns.len());
        for name in &self.columns {
            if let Some((name, ty)) = columns.shift_remove_entry(name.as_str()) {
                reordered.insert(name, ty);
            }
        }
        reordered.extend(columns);

        info!(
            key = %self.kind,
            original = ?original,
            reordered = ?reordered.keys().collect::<Vec<_>>(),
            "Reordered columns for table key"
        );
        Ok(reordered)
    }
}

/// Column names from a canonical column list, a tuple, a column or a string
pub fn column_names(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::List(items) => items.iter().map(item_name).collect(),
        Value::Node(Expr::Tuple { items }) => Ok(items.iter().map(node_name).collect()),
        Value::Node(Expr::Column { name }) | Value::Text(name) => Ok(vec![name.clone()]),
        other => Err(PropertyError::KeyColumns(format!(
            "unsupported key column value {} ({})",
            other,
            other.kind()
        ))),
    }
}

fn item_name(item: &Value) -> Result<String> {
    match item {
        Value::Node(node) => Ok(node_name(node)),
        Value::Text(name) => Ok(name.clone()),
        other => Err(PropertyError::KeyColumns(format!(
            "unsupported key column {}",
            other
        ))),
    }
}

fn node_name(node: &Expr) -> String {
    match node {
        Expr::Column { name } | Expr::Identifier { name } => name.clone(),
        other => other.text().unwrap_or_else(|| other.to_string()),
    }
}
