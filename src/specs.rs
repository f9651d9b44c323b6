//! Table property schemas and the two-stage pipeline
//!
//! Every property has an input type (loose, alias tolerant) and an output
//! type (the one canonical shape consumers may rely on). Properties without
//! an entry fall back to the generic types.
//!
//! | property                         | input                                 | output                       |
//! |----------------------------------|---------------------------------------|------------------------------|
//! | `*_key`, `order_by`              | column list, single value promoted    | `SequenceOf[ColumnType]`     |
//! | `partitioned_by`                 | column list plus function calls       | columns or function calls    |
//! | `partitions`                     | list of partition definition strings  | list of strings              |
//! | `distributed_by`                 | structured tuple, `RANDOM` or `HASH()`| same union                   |
//! | anything else                    | string, literal or bare word          | string or expression         |

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::error::{PropertyError, Result};
use crate::types::{
    AnyOf, ColumnType, EnumType, ExpressionType, Field, FieldPolicy, FuncType, IdentifierType,
    LiteralType, Repr, SequenceOf, StringType, StructuredTupleType, TypeRef,
};
use crate::value::Value;

pub const PRIMARY_KEY: &str = "primary_key";
pub const DUPLICATE_KEY: &str = "duplicate_key";
pub const UNIQUE_KEY: &str = "unique_key";
pub const AGGREGATE_KEY: &str = "aggregate_key";
pub const ORDER_BY: &str = "order_by";
pub const PARTITIONED_BY: &str = "partitioned_by";
pub const PARTITIONS: &str = "partitions";
pub const DISTRIBUTED_BY: &str = "distributed_by";

const KEY_PROPERTIES: [&str; 4] = [PRIMARY_KEY, DUPLICATE_KEY, UNIQUE_KEY, AGGREGATE_KEY];

// ============================================================================
// Schema Constructors
// ============================================================================

/// `id`, `(id, dt)`, `['id', "dt"]` as a list of columns
pub fn column_list_input() -> Result<SequenceOf> {
    SequenceOf::new(vec![
        Arc::new(ColumnType::new()),
        Arc::new(IdentifierType::normalized_as(Repr::Column)),
        Arc::new(StringType::normalized_as(Repr::Column)),
    ])
}

/// Column lists plus partition functions: `RANGE(dt)`, `date_trunc('day', dt)`
pub fn partitioned_by_input() -> Result<SequenceOf> {
    SequenceOf::new(vec![
        Arc::new(ColumnType::new()),
        Arc::new(FuncType::new()),
        Arc::new(IdentifierType::normalized_as(Repr::Column)),
        Arc::new(StringType::normalized_as(Repr::Column)),
    ])
}

/// Partition definitions, kept as whole strings
pub fn partitions_input() -> Result<SequenceOf> {
    SequenceOf::new(vec![Arc::new(StringType::new())])
}

/// `(kind='HASH', columns=(id, dt), buckets=10)`
pub fn distribution_tuple(policy: FieldPolicy) -> Result<StructuredTupleType> {
    let columns = SequenceOf::new(vec![
        Arc::new(ColumnType::new()),
        Arc::new(IdentifierType::normalized_as(Repr::Column)),
    ])?;
    let buckets = AnyOf::new(vec![
        Arc::new(LiteralType::new()),
        Arc::new(StringType::new()),
    ])?;

    StructuredTupleType::new(
        "DistributionTupleType",
        [
            (
                "kind",
                Field::new(EnumType::new(["HASH", "RANDOM"])?)
                    .required()
                    .doc("Distribution kind: HASH or RANDOM"),
            ),
            (
                "columns",
                Field::new(columns)
                    .alias("expressions")
                    .doc("Hash columns, required by HASH in practice"),
            ),
            (
                "buckets",
                Field::new(buckets)
                    .alias("bucket")
                    .alias("bucket_num")
                    .doc("Bucket count"),
            ),
        ],
        policy,
    )
}

/// Structured tuple first, then the `RANDOM` keyword, then `HASH(...)` calls
pub fn distributed_by(policy: FieldPolicy) -> Result<AnyOf> {
    AnyOf::new(vec![
        Arc::new(distribution_tuple(policy)?),
        Arc::new(EnumType::new(["RANDOM"])?),
        Arc::new(FuncType::new()),
    ])
}

/// Fallback input type: everything becomes a plain string
pub fn generic_input() -> Result<AnyOf> {
    AnyOf::new(vec![
        Arc::new(StringType::new()),
        Arc::new(LiteralType::normalized_as(Repr::Str)),
        Arc::new(IdentifierType::normalized_as(Repr::Str)),
        Arc::new(ColumnType::normalized_as(Repr::Str)),
    ])
}

/// Fallback output type
pub fn generic_output() -> Result<AnyOf> {
    AnyOf::new(vec![
        Arc::new(StringType::new()),
        Arc::new(ExpressionType::new()),
    ])
}

fn column_list_output() -> Result<SequenceOf> {
    Ok(SequenceOf::new(vec![Arc::new(ColumnType::new())])?.allow_single(false))
}

// ============================================================================
// Registries
// ============================================================================

/// Paired input and output registries for table properties
#[derive(Debug, Clone)]
pub struct PropertySpecs {
    input: IndexMap<String, TypeRef>,
    output: IndexMap<String, TypeRef>,
    generic_input: TypeRef,
    generic_output: TypeRef,
    lowercase_names: bool,
}

impl PropertySpecs {
    /// Table property registries with the given structured tuple policy
    pub fn new(policy: FieldPolicy) -> Result<Self> {
        let column_list: TypeRef = Arc::new(column_list_input()?);
        let column_output: TypeRef = Arc::new(column_list_output()?);
        let distribution: TypeRef = Arc::new(distributed_by(policy)?);

        let mut input: IndexMap<String, TypeRef> = IndexMap::new();
        let mut output: IndexMap<String, TypeRef> = IndexMap::new();
        for name in KEY_PROPERTIES.into_iter().chain([ORDER_BY]) {
            input.insert(name.to_string(), column_list.clone());
            output.insert(name.to_string(), column_output.clone());
        }

        input.insert(PARTITIONED_BY.to_string(), Arc::new(partitioned_by_input()?));
        output.insert(
            PARTITIONED_BY.to_string(),
            Arc::new(
                SequenceOf::new(vec![Arc::new(ColumnType::new()), Arc::new(FuncType::new())])?
                    .allow_single(false),
            ),
        );

        input.insert(PARTITIONS.to_string(), Arc::new(partitions_input()?));
        output.insert(
            PARTITIONS.to_string(),
            Arc::new(partitions_input()?.allow_single(false)),
        );

        input.insert(DISTRIBUTED_BY.to_string(), distribution.clone());
        output.insert(DISTRIBUTED_BY.to_string(), distribution);

        Ok(Self {
            input,
            output,
            generic_input: Arc::new(generic_input()?),
            generic_output: Arc::new(generic_output()?),
            lowercase_names: true,
        })
    }

    /// Registries built from a loaded configuration
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        let mut specs = Self::new(config.structured)?;
        specs.lowercase_names = config.properties.lowercase_names;
        Ok(specs)
    }

    /// Register or replace the input type of a property
    pub fn with_input(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.input.insert(name.into(), ty);
        self
    }

    /// Register or replace the output type of a property
    pub fn with_output(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.output.insert(name.into(), ty);
        self
    }

    /// Names with an explicit input type, in registration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.input.keys().map(String::as_str)
    }

    fn lookup_name(&self, name: &str) -> String {
        if self.lowercase_names {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Input type of a property, generic when unregistered
    pub fn input_type(&self, name: &str) -> &TypeRef {
        self.input
            .get(&self.lookup_name(name))
            .unwrap_or(&self.generic_input)
    }

    /// Output type of a property, generic when unregistered
    pub fn output_type(&self, name: &str) -> &TypeRef {
        self.output
            .get(&self.lookup_name(name))
            .unwrap_or(&self.generic_output)
    }

    /// Validate a raw value, normalize it and check the output contract
    pub fn validate_and_normalize(&self, name: &str, value: &Value) -> Result<Value> {
        let property = self.lookup_name(name);
        let input_type = self.input_type(&property);
        debug!(property = %property, value = %value, "Validating property");

        let Some(validated) = input_type.validate(value)? else {
            return Err(PropertyError::InvalidInput {
                property,
                value: value.to_string(),
                expected: input_type.type_name(),
            });
        };
        let normalized = input_type.normalize(validated);

        let output_type = self.output_type(&property);
        match output_type.validate(&normalized) {
            Ok(Some(_)) => {
                debug!(property = %property, normalized = %normalized, "Normalized property");
                Ok(normalized)
            }
            Ok(None) => Err(PropertyError::OutputContract {
                property,
                value: normalized.to_string(),
                expected: output_type.type_name(),
            }),
            Err(e) => Err(PropertyError::OutputContract {
                property,
                value: normalized.to_string(),
                expected: format!("{} ({})", output_type.type_name(), e),
            }),
        }
    }

    /// Run the pipeline over every property, keeping the input order
    pub fn normalize_all(&self, properties: &IndexMap<String, Value>) -> Result<IndexMap<String, Value>> {
        properties
            .iter()
            .map(|(name, value)| {
                let normalized = self.validate_and_normalize(name, value)?;
                Ok((self.lookup_name(name), normalized))
            })
            .collect()
    }
}

impl Default for PropertySpecs {
    fn default() -> Self {
        Self::new(FieldPolicy::default()).expect("built-in property schemas are well formed")
    }
}
