//! Error types for property validation

use thiserror::Error;

/// Result type for property operations
pub type Result<T> = std::result::Result<T, PropertyError>;

/// Machine-distinguishable error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A structured tuple key matched no field or alias
    UnknownField,
    /// A field value failed its type, or a required field was absent
    InvalidField,
    /// A raw property value did not validate against its input type
    InputValidation,
    /// A normalized value did not satisfy the declared output type
    OutputContract,
    /// A schema broke a construction invariant
    Definition,
    /// A string fragment could not be read
    Parse,
    /// A canonical value could not be converted to a derived form
    Conversion,
    /// Configuration could not be loaded or saved
    Config,
}

/// Property validation errors
#[derive(Error, Debug)]
pub enum PropertyError {
    #[error("Unknown field '{field}' in {schema}. Valid fields: {valid:?}")]
    UnknownField {
        schema: String,
        field: String,
        valid: Vec<String>,
    },

    #[error("Invalid value for field '{field}' in {schema}: {value}. Expected type: {expected}")]
    InvalidField {
        schema: String,
        field: String,
        value: String,
        expected: String,
    },

    #[error("Required field '{field}' is missing in {schema}")]
    MissingField { schema: String, field: String },

    #[error("Invalid value for property '{property}': {value}. Expected type: {expected}")]
    InvalidInput {
        property: String,
        value: String,
        expected: String,
    },

    #[error("Output contract violated for property '{property}': normalized value {value} does not conform to {expected}")]
    OutputContract {
        property: String,
        value: String,
        expected: String,
    },

    #[error("Value {value} does not conform to type {expected}")]
    NonConforming { value: String, expected: String },

    #[error("Invalid schema definition: {0}")]
    SchemaDefinition(String),

    #[error("Unable to read fragment '{text}': {reason}")]
    Fragment { text: String, reason: String },

    #[error("Invalid distribution: {0}")]
    Distribution(String),

    #[error("Invalid key columns: {0}")]
    KeyColumns(String),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropertyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PropertyError::UnknownField { .. } => ErrorKind::UnknownField,
            PropertyError::InvalidField { .. } | PropertyError::MissingField { .. } => {
                ErrorKind::InvalidField
            }
            PropertyError::InvalidInput { .. } | PropertyError::NonConforming { .. } => {
                ErrorKind::InputValidation
            }
            PropertyError::OutputContract { .. } => ErrorKind::OutputContract,
            PropertyError::SchemaDefinition(_) => ErrorKind::Definition,
            PropertyError::Fragment { .. } => ErrorKind::Parse,
            PropertyError::Distribution(_) | PropertyError::KeyColumns(_) => ErrorKind::Conversion,
            PropertyError::Config(_) | PropertyError::Io(_) => ErrorKind::Config,
        }
    }

    /// Name of the offending structured field, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            PropertyError::UnknownField { field, .. }
            | PropertyError::InvalidField { field, .. }
            | PropertyError::MissingField { field, .. } => Some(field),
            _ => None,
        }
    }
}
