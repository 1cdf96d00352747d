use thiserror::Error;

/// Errors raised while registering or querying entity schemas.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Entity type name must not be empty")]
    EmptyTypeName,

    #[error("No schema registered for type: {0}")]
    UnknownType(String),

    #[error("Schema for type {0} is registered twice")]
    DuplicateType(String),

    #[error("Property {property} is declared twice on {type_name}")]
    DuplicateProperty { type_name: String, property: String },

    #[error("Type {0} declares no key property")]
    NoKeyProperty(String),

    #[error("Output name {output_name:?} of {type_name}.{property} is not a usable element name")]
    InvalidOutputName {
        type_name: String,
        property: String,
        output_name: String,
    },

    #[error("Key property {property} of {type_name} has no value")]
    NullKeyValue { type_name: String, property: String },
}

impl SchemaError {
    /// True for the "this type has no usable key" conditions.
    pub fn is_missing_key(&self) -> bool {
        matches!(
            self,
            SchemaError::NoKeyProperty(_) | SchemaError::NullKeyValue { .. }
        )
    }
}
