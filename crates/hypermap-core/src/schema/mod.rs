//! Statically declared entity metadata.
//!
//! Every entity type that takes part in hypermedia output is described by an
//! [`EntitySchema`]: its key properties, its primitive state, and its
//! navigation properties. Schemas are collected into an immutable
//! [`SchemaRegistry`] at startup and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust
//! use hypermap_core::schema::{EntitySchema, PropertySchema, SchemaRegistry};
//! use hypermap_core::model::ValueKind;
//!
//! let registry = SchemaRegistry::builder()
//!     .register(
//!         EntitySchema::new("Product")
//!             .with(PropertySchema::state("Id", ValueKind::Int).key())
//!             .with(PropertySchema::state("Name", ValueKind::String).included()),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.contains("Product"));
//! ```

mod error;
mod key;
mod registry;

pub use error::SchemaError;
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};

use serde::{Deserialize, Serialize};

use crate::model::ValueKind;

// =============================================================================
// Property Metadata
// =============================================================================

/// What a property holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum PropertyKind {
    /// Primitive value of the given kind.
    State(ValueKind),
    /// A single related entity of the named type.
    Reference(String),
    /// A collection of related entities of the named type.
    Collection(String),
}

impl PropertyKind {
    /// Target entity type of a navigation property.
    pub fn target(&self) -> Option<&str> {
        match self {
            PropertyKind::State(_) => None,
            PropertyKind::Reference(t) | PropertyKind::Collection(t) => Some(t),
        }
    }

    pub fn is_navigation(&self) -> bool {
        !matches!(self, PropertyKind::State(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, PropertyKind::Collection(_))
    }
}

/// Marks a property as part of the entity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAnnotation {
    /// Explicit ordering among several keys; lowest wins.
    pub order: Option<u32>,
}

/// Output rules for a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitPolicy {
    /// Explicit opt-in for state properties.
    pub include: bool,
    /// Never emitted, even when included.
    pub ignore: bool,
    /// Skip the property when its value is the type default. `None` defers
    /// to the format's own default.
    pub omit_default: Option<bool>,
}

/// Metadata for one declared property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(default)]
    pub key: Option<KeyAnnotation>,
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub emit: EmitPolicy,
}

impl PropertySchema {
    fn with_kind(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            key: None,
            output_name: None,
            emit: EmitPolicy::default(),
        }
    }

    pub fn state(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::with_kind(name, PropertyKind::State(kind))
    }

    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(name, PropertyKind::Reference(target.into()))
    }

    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::with_kind(name, PropertyKind::Collection(target.into()))
    }

    /// Mark as a key without an explicit order.
    pub fn key(mut self) -> Self {
        self.key = Some(KeyAnnotation { order: None });
        self
    }

    /// Mark as a key with an explicit order.
    pub fn key_order(mut self, order: u32) -> Self {
        self.key = Some(KeyAnnotation { order: Some(order) });
        self
    }

    /// Opt the property into serialized output.
    pub fn included(mut self) -> Self {
        self.emit.include = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.emit.ignore = true;
        self
    }

    pub fn omit_default(mut self, omit: bool) -> Self {
        self.emit.omit_default = Some(omit);
        self
    }

    /// Override the name used in serialized output.
    pub fn rename(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = Some(output_name.into());
        self
    }

    /// Name used in serialized output.
    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_key(&self) -> bool {
        self.key.is_some()
    }

    /// Whether a state property is eligible for output at all.
    pub fn is_emitted(&self) -> bool {
        self.emit.include && !self.emit.ignore
    }

    /// Whether a state value should be written, given the format's
    /// omit-default polarity.
    pub fn should_emit(&self, value: &crate::model::Value, omit_default_fallback: bool) -> bool {
        if !self.is_emitted() {
            return false;
        }
        let omit = self.emit.omit_default.unwrap_or(omit_default_fallback);
        !(omit && value.is_default())
    }
}

// =============================================================================
// Entity Schema
// =============================================================================

/// Declared metadata for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub type_name: String,
    /// Properties in declaration order.
    pub properties: Vec<PropertySchema>,
}

impl EntitySchema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
        }
    }

    /// Append a property declaration.
    pub fn with(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Find a property by its serialized name.
    pub fn property_by_output_name(&self, output_name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .find(|p| p.output_name() == output_name)
    }

    pub fn state_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties
            .iter()
            .filter(|p| matches!(p.kind, PropertyKind::State(_)))
    }

    pub fn navigation_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties.iter().filter(|p| p.kind.is_navigation())
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.type_name.trim().is_empty() {
            return Err(SchemaError::EmptyTypeName);
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.properties {
            if !seen.insert(p.name.as_str()) {
                return Err(SchemaError::DuplicateProperty {
                    type_name: self.type_name.clone(),
                    property: p.name.clone(),
                });
            }
            if !is_output_name(p.output_name()) {
                return Err(SchemaError::InvalidOutputName {
                    type_name: self.type_name.clone(),
                    property: p.name.clone(),
                    output_name: p.output_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Names the HAL documents reserve for their own structure.
const RESERVED_NAMES: &[&str] = &["link", "resource", "_links", "_embedded"];

/// An XML NCName that does not collide with the reserved HAL names.
fn is_output_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !RESERVED_NAMES.contains(&name)
}
